/// Locale codes the relay knows a display name for. Anything else falls
/// back to the raw code, which keeps prompts usable for unlisted locales.
const LANGUAGES: &[(&str, &str)] = &[
    ("en-US", "English"),
    ("es-ES", "Spanish"),
    ("fr-FR", "French"),
    ("de-DE", "German"),
    ("it-IT", "Italian"),
    ("pt-BR", "Portuguese"),
    ("ja-JP", "Japanese"),
    ("ko-KR", "Korean"),
    ("zh-CN", "Chinese"),
    ("hi-IN", "Hindi"),
    ("ar-SA", "Arabic"),
];

/// Human-readable language name for a locale code, used in prompts and UI.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// The language portion of a locale code preceding the region
/// (`en` from `en-US`). Two locales sharing a base tag need no translation.
pub fn base_tag(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}
