use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive,
/// dangerous tags (like <script>, <iframe>) and event-handler attributes
/// are stripped. Applied to everything end users or admins type that
/// later gets rendered: contact messages, quiz descriptions, question
/// prompts.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
