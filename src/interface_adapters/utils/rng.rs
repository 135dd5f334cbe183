use rand::Rng;
use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LEN: usize = 6;

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Returns a process-unique, monotonically increasing identifier.
///
/// Used for player ids and connection ids, so two sockets opened in the same instant
/// still get distinct values.
pub fn rand_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_nanos()));
    counter.fetch_add(1, Ordering::Relaxed)
}

/// Short shareable room code. Ambiguous glyphs (0/O, 1/I) are left out.
pub fn room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let first = rand_id();
        let second = rand_id();
        assert_ne!(first, second);
    }

    #[test]
    fn room_codes_use_the_readable_alphabet() {
        let code = room_code();
        assert_eq!(code.len(), ROOM_CODE_LEN);
        assert!(code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
    }
}
