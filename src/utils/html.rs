// src/utils/html.rs

/// Sanitizes user-supplied rich text (listing descriptions, booking notes).
///
/// Whitelist-based: safe formatting tags such as <b> and <p> survive, while
/// <script>, <iframe> and event-handler attributes are stripped together with
/// their content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
