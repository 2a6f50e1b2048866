/// Mask the local part of an email for display; the domain stays readable.
///
/// Local parts of up to three characters keep their first character, longer
/// ones keep two. Every hidden character becomes `*`.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let (local, domain) = match email.split_once('@') {
        Some((local, domain)) => (local, Some(domain)),
        None => (email, None),
    };

    let length = local.chars().count();
    let keep = if length <= 3 { 1 } else { 2 };

    let mut masked: String = local.chars().take(keep).collect();
    masked.push_str(&"*".repeat(length.saturating_sub(keep)));

    if let Some(domain) = domain {
        masked.push('@');
        masked.push_str(domain);
    }

    masked
}
