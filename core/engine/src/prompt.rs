//! System-prompt template substitution.

use hic_protocol::Profile;

/// Substitute `{{name}}` and `{{facts}}` placeholders in `template` with
/// values drawn from `profile`. Unrecognized placeholders are left as-is.
pub fn render_system_prompt(template: &str, profile: &Profile) -> String {
    let name = profile.name.as_deref().unwrap_or("the user");
    template
        .replace("{{name}}", name)
        .replace("{{facts}}", &profile.render_facts())
}
