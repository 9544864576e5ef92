//! Thread-local Win32 last-error slot.

use std::cell::Cell;

pub const ERROR_SUCCESS: u32 = 0;
pub const ERROR_INVALID_PARAMETER: u32 = 87;
pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
pub const ERROR_NOT_FOUND: u32 = 1168;

std::thread_local! {
    static LAST_ERROR: Cell<u32> = const { Cell::new(ERROR_SUCCESS) };
}

pub(crate) fn set(code: u32) {
    LAST_ERROR.with(|cell| cell.set(code));
}

pub(crate) fn get() -> u32 {
    LAST_ERROR.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_per_thread() {
        set(ERROR_NOT_FOUND);
        let other = std::thread::spawn(get).join().unwrap();
        assert_eq!(other, ERROR_SUCCESS);
        assert_eq!(get(), ERROR_NOT_FOUND);
        set(ERROR_SUCCESS);
    }
}
