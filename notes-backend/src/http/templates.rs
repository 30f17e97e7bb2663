//! HTML pages
//!
//! Every page shares [`layout`]; user-supplied text is escaped on the way in.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::forms::{FormErrors, NoteForm};
use crate::models::{Note, User};
use crate::urls::Route;

/// Target of the note form.
#[derive(Debug, Clone, Copy)]
pub enum NoteFormAction<'a> {
    Add,
    Edit(&'a str),
}

impl NoteFormAction<'_> {
    fn route(&self) -> Route<'_> {
        match self {
            NoteFormAction::Add => Route::Add,
            NoteFormAction::Edit(slug) => Route::Edit(slug),
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            NoteFormAction::Add => "Добавить запись",
            NoteFormAction::Edit(_) => "Редактировать запись",
        }
    }
}

fn layout(title: &str, user: Option<&User>, content: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<a href="{list}">Все заметки</a>
      <a href="{add}">Добавить заметку</a>
      <span class="user">{username}</span>
      <form class="logout" method="post" action="{logout}"><button type="submit">Выйти</button></form>"#,
            list = Route::List.path(),
            add = Route::Add.path(),
            username = text(&user.username),
            logout = Route::Logout.path(),
        ),
        None => format!(
            r#"<a href="{login}">Войти</a>
      <a href="{signup}">Регистрация</a>"#,
            login = Route::Login.path(),
            signup = Route::Signup.path(),
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
</head>
<body>
  <header>
    <nav>
      <a href="{home}">Главная</a>
      {nav}
    </nav>
  </header>
  <main>
{content}
  </main>
</body>
</html>
"#,
        title = text(title),
        home = Route::Home.path(),
        nav = nav,
        content = content,
    )
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", text(m)))
        .collect();
    format!(r#"<ul class="errorlist">{}</ul>"#, items)
}

fn text_input(name: &str, label: &str, value: &str, input_type: &str, errors: &FormErrors) -> String {
    format!(
        r#"<p>
      <label for="id_{name}">{label}</label>
      {errors}
      <input type="{input_type}" name="{name}" id="id_{name}" value="{value}">
    </p>"#,
        name = name,
        label = label,
        errors = error_list(errors.field(name)),
        input_type = input_type,
        value = attr(value),
    )
}

pub fn home_page(user: Option<&User>) -> String {
    let content = match user {
        Some(user) => format!(
            r#"<h1>Заметки</h1>
    <p>Здравствуйте, {}! Ваши заметки видны только вам.</p>
    <p><a href="{}">Перейти к списку</a></p>"#,
            text(&user.username),
            Route::List.path()
        ),
        None => format!(
            r#"<h1>Заметки</h1>
    <p>Личные заметки. <a href="{}">Войдите</a> или <a href="{}">зарегистрируйтесь</a>, чтобы начать.</p>"#,
            Route::Login.path(),
            Route::Signup.path()
        ),
    };
    layout("Главная", user, &content)
}

pub fn note_list_page(user: &User, notes: &[Note]) -> String {
    let body = if notes.is_empty() {
        "<p>Заметок пока нет.</p>".to_string()
    } else {
        let items: String = notes
            .iter()
            .map(|note| {
                format!(
                    r#"
      <li><a href="{}">{}</a></li>"#,
                    attr(&Route::Detail(&note.slug).path()),
                    text(&note.title)
                )
            })
            .collect();
        format!(r#"<ul class="object_list">{}
    </ul>"#, items)
    };
    let content = format!("<h1>Ваши заметки</h1>\n    {}", body);
    layout("Заметки", Some(user), &content)
}

pub fn note_detail_page(user: &User, note: &Note) -> String {
    let paragraphs: String = note
        .text
        .lines()
        .map(|line| format!("<p>{}</p>", text(line)))
        .collect();
    let content = format!(
        r#"<article class="note">
    <h1>{title}</h1>
    {paragraphs}
    </article>
    <p>
      <a href="{edit}">Редактировать</a>
      <a href="{delete}">Удалить</a>
    </p>"#,
        title = text(&note.title),
        paragraphs = paragraphs,
        edit = attr(&Route::Edit(&note.slug).path()),
        delete = attr(&Route::Delete(&note.slug).path()),
    );
    layout(&note.title, Some(user), &content)
}

pub fn note_form_page(user: &User, action: NoteFormAction<'_>, form: &NoteForm, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>{heading}</h1>
    <form method="post" action="{action}" id="note-form">
    {non_field}
    {title}
    <p>
      <label for="id_text">Текст</label>
      {text_errors}
      <textarea name="text" id="id_text">{text_value}</textarea>
    </p>
    {slug}
    <p class="help">Адрес для страницы с заметкой. Можно оставить пустым, тогда он составится из заголовка.</p>
    <button type="submit">Сохранить</button>
    </form>"#,
        heading = action.heading(),
        action = attr(&action.route().path()),
        non_field = error_list(errors.non_field()),
        title = text_input("title", "Заголовок", &form.title, "text", errors),
        text_errors = error_list(errors.field("text")),
        text_value = text(&form.text),
        slug = text_input("slug", "Адрес для страницы с заметкой", &form.slug, "text", errors),
    );
    layout(action.heading(), Some(user), &content)
}

pub fn note_delete_page(user: &User, note: &Note) -> String {
    let content = format!(
        r#"<h1>Удалить заметку «{title}»?</h1>
    <form method="post" action="{action}">
      <button type="submit">Удалить</button>
      <a href="{back}">Отмена</a>
    </form>"#,
        title = text(&note.title),
        action = attr(&Route::Delete(&note.slug).path()),
        back = attr(&Route::Detail(&note.slug).path()),
    );
    layout("Удаление заметки", Some(user), &content)
}

pub fn success_page(user: &User) -> String {
    let content = format!(
        r#"<h1>Успешно!</h1>
    <p><a href="{}">К списку заметок</a></p>"#,
        Route::List.path()
    );
    layout("Успешно", Some(user), &content)
}

pub fn login_page(user: Option<&User>, username: &str, next: Option<&str>, errors: &FormErrors) -> String {
    let next_input = next
        .map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, attr(n)))
        .unwrap_or_default();
    let content = format!(
        r#"<h1>Вход</h1>
    <form method="post" action="{action}">
    {non_field}
    {username}
    {password}
    {next_input}
    <button type="submit">Войти</button>
    </form>"#,
        action = Route::Login.path(),
        non_field = error_list(errors.non_field()),
        username = text_input("username", "Имя пользователя", username, "text", errors),
        password = text_input("password", "Пароль", "", "password", errors),
        next_input = next_input,
    );
    layout("Вход", user, &content)
}

pub fn signup_page(user: Option<&User>, username: &str, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Регистрация</h1>
    <form method="post" action="{action}">
    {non_field}
    {username}
    {password1}
    {password2}
    <button type="submit">Зарегистрироваться</button>
    </form>"#,
        action = Route::Signup.path(),
        non_field = error_list(errors.non_field()),
        username = text_input("username", "Имя пользователя", username, "text", errors),
        password1 = text_input("password1", "Пароль", "", "password", errors),
        password2 = text_input("password2", "Подтверждение пароля", "", "password", errors),
    );
    layout("Регистрация", user, &content)
}

pub fn logged_out_page() -> String {
    let content = format!(
        r#"<h1>Вы вышли из системы</h1>
    <p><a href="{}">Войти снова</a></p>"#,
        Route::Login.path()
    );
    layout("Выход", None, &content)
}

pub fn not_found_page(user: Option<&User>) -> String {
    layout(
        "Страница не найдена",
        user,
        "<h1>Страница не найдена</h1>\n    <p>Запрошенная страница не существует.</p>",
    )
}

pub fn bad_request_page(user: Option<&User>) -> String {
    layout(
        "Некорректный запрос",
        user,
        "<h1>Некорректный запрос</h1>\n    <p>Не удалось прочитать данные формы.</p>",
    )
}

pub fn server_error_page() -> String {
    layout(
        "Ошибка сервера",
        None,
        "<h1>Ошибка сервера</h1>\n    <p>Попробуйте повторить запрос позже.</p>",
    )
}
