use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of a broker-assigned endpoint key (spec §6: "8 characters
/// from `[a-zA-Z0-9]`").
pub const KEY_LEN: usize = 8;

/// Length of a minted group id. The spec only constrains endpoint key
/// length; group ids just need to be unguessable and distinct, so we
/// give them more entropy than a key.
const GROUP_ID_LEN: usize = 16;

fn random_alphanumeric(len: usize) -> String {
	rand::rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generate a fresh 8-character alphanumeric endpoint key.
pub fn generate_key() -> String {
	random_alphanumeric(KEY_LEN)
}

/// Generate a fresh group id, minted when a connecting endpoint omits
/// `group_id` (spec §4.2: "mint a fresh random group id owned solely
/// by this endpoint").
pub fn generate_group_id() -> String {
	random_alphanumeric(GROUP_ID_LEN)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generated_key_has_expected_length_and_alphabet() {
		let key = generate_key();
		assert_eq!(key.len(), KEY_LEN);
		assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
	}

	#[test]
	fn generated_keys_are_not_trivially_repeated() {
		let a = generate_key();
		let b = generate_key();
		assert_ne!(a, b);
	}
}
