use pulldown_cmark::{html, Options, Parser};

/// Converts markdown to HTML, appending the result onto `w`.
///
/// Footnotes, smart punctuation, strikethrough, tables, and task lists are
/// enabled.
pub fn to_html(w: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(w, Parser::new_ext(markdown, options));
}
