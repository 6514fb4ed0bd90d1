//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }

    let provider = &config.provider;
    if provider.model.trim().is_empty() {
        errors.push("provider.model must not be empty".to_string());
    }
    if !(0.0..=2.0).contains(&provider.temperature) {
        errors.push("provider.temperature must be in [0.0, 2.0]".to_string());
    }
    if !(provider.top_p > 0.0 && provider.top_p <= 1.0) {
        errors.push("provider.top_p must be in (0.0, 1.0]".to_string());
    }
    if provider.top_k == 0 {
        errors.push("provider.top_k must be > 0".to_string());
    }
    if provider.max_output_tokens == 0 {
        errors.push("provider.max_output_tokens must be > 0".to_string());
    }
    if provider.timeout_secs == 0 {
        errors.push("provider.timeout_secs must be > 0".to_string());
    }
    if let Some(base) = &provider.api_base {
        if !base.trim().is_empty()
            && !(base.starts_with("http://") || base.starts_with("https://"))
        {
            errors.push("provider.api_base must be an http(s) URL".to_string());
        }
    }

    if config.persona.instruction.trim().is_empty() {
        errors.push("persona.instruction must not be empty".to_string());
    }
    if config.persona.acknowledgment.trim().is_empty() {
        errors.push("persona.acknowledgment must not be empty".to_string());
    }

    if config.sessions.max_sessions == 0 {
        errors.push("sessions.max_sessions must be > 0".to_string());
    }
    if config.sessions.idle_timeout_secs == 0 {
        errors.push("sessions.idle_timeout_secs must be > 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
