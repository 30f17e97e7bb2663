//! Slug generation for note URLs
//!
//! Titles are transliterated from Cyrillic to Latin before slugification, so
//! "Заметка № 1" becomes "zametka-1".

/// Longest slug a note may carry, generated or submitted.
pub const MAX_SLUG_LEN: usize = 100;

/// Latin spelling of a lowercase Cyrillic letter. `Some("")` means the letter
/// is dropped (hard and soft signs).
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        'є' => "ye",
        'і' => "i",
        'ї' => "yi",
        'ґ' => "g",
        _ => return None,
    };
    Some(latin)
}

/// Slugify a title for use in a URL (e.g. "Новая заметка" -> "novaya-zametka").
///
/// `&` is spelled out as "and"; whitespace and hyphen runs become a single
/// hyphen; ASCII letters, digits and `_` are kept; Cyrillic letters are
/// transliterated; any other symbol is dropped without leaving a separator.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase().replace("&amp;", "&").replace('&', " and ");

    let mut out = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            pending_separator = true;
            continue;
        }

        let mut buf = [0u8; 4];
        let piece: &str = if c.is_ascii_alphanumeric() || c == '_' {
            c.encode_utf8(&mut buf)
        } else {
            match transliterate(c) {
                Some(latin) => latin,
                None => continue,
            }
        };
        if piece.is_empty() {
            continue;
        }

        if pending_separator && !out.is_empty() {
            out.push('-');
        }
        pending_separator = false;
        out.push_str(piece);
    }
    out
}

/// Slug derived from a note title, cut to [`MAX_SLUG_LEN`].
pub fn slug_from_title(title: &str) -> String {
    slugify(title).chars().take(MAX_SLUG_LEN).collect()
}

/// True if `slug` only holds ASCII letters, digits, underscores and hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
