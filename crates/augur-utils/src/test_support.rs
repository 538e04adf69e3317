//! Fixtures shared by unit and integration tests across the workspace.

use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::types::{Profile, Topic};

/// Serialize tests that mutate process environment variables.
pub fn env_lock() -> MutexGuard<'static, ()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[must_use]
pub fn sample_profile() -> Profile {
    Profile::new("Anna", "15.03.1990", "Should I change jobs this year?", Topic::Career)
}

#[must_use]
pub fn sample_love_profile() -> Profile {
    Profile::new("Anna", "15.03.1990", "Is he the one?", Topic::Love).with_partner("Boris", "02.11.1988")
}

/// A narrative in the delimited three-part shape the prompt asks for
#[must_use]
pub fn three_part_narrative() -> String {
    [
        "The Tower stands behind you: the old foundations are cracking.",
        "The Star rises over the present, promising renewal.",
        "The Sun waits ahead; fire and warmth follow the change.",
    ]
    .join("\n\n***\n\n")
}

/// The 8-byte PNG signature followed by a minimal IHDR chunk header.
#[must_use]
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
    ]
}

/// Shaped like an OpenRouter key so the redaction rules recognize it
#[must_use]
pub fn openrouter_key() -> String {
    format!("sk-or-v1-{}", "0123456789abcdef".repeat(4))
}

#[must_use]
pub fn image_key() -> String {
    "KEY0123456789ABCDEF".to_string()
}

#[must_use]
pub fn image_secret() -> String {
    "SECRET0123456789ABCDEF".to_string()
}
