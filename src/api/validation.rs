use super::ApiError;

pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.len() < 2 {
        return Err(ApiError::validation(
            "Name must be at least 2 characters long",
        ));
    }
    if trimmed.len() > 120 {
        return Err(ApiError::validation("Name must be 120 characters or less"));
    }
    Ok(trimmed)
}

/// Normalizes an email to its canonical lowercase form. Normalization at
/// every boundary is what keeps mixed-case input from minting duplicate
/// identities.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let normalized = email.trim().to_lowercase();

    let mut parts = normalized.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(ApiError::validation(format!("Invalid email: {email}")));
    }

    Ok(normalized)
}

/// Strips non-digits and requires exactly 11 digits, as CPFs are stored.
pub fn validate_cpf(cpf: &str) -> Result<String, ApiError> {
    let digits: String = cpf.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 11 {
        return Err(ApiError::validation("CPF must contain exactly 11 digits"));
    }
    Ok(digits)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters long",
        ));
    }
    Ok(password)
}

/// Report URLs are optional, but when present must be absolute http(s) URLs.
/// Blank values normalize to unset.
pub fn validate_report_url(url: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(raw) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };

    let parsed = url::Url::parse(raw)
        .map_err(|_| ApiError::validation(format!("Invalid report URL: {raw}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ApiError::validation(format!(
            "Report URL must be http(s): {raw}"
        )));
    }

    Ok(Some(raw.to_string()))
}
