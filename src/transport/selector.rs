use super::TransportKind;

/// Scheme prefixes served by the request/response endpoint.
const ONE_SHOT_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Decide which transport serves `address`.
///
/// HTTP-family addresses use the one-shot endpoint; everything else,
/// including unrecognized schemes, falls back to the interactive transport.
pub fn classify(address: &str) -> TransportKind {
    let address = address.trim_start();
    let is_one_shot = ONE_SHOT_SCHEMES.iter().any(|scheme| {
        address
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });

    if is_one_shot {
        TransportKind::OneShot
    } else {
        TransportKind::Interactive
    }
}
