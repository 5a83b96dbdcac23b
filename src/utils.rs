use blake2::blake2b::blake2b;
use failure::Fail;
use serde::{Serialize, de::DeserializeOwned};
use std::{marker::PhantomData, sync::atomic::{AtomicUsize, Ordering}};

/// Length of the authentication tag appended to signed tokens.
const TAG_LENGTH: usize = 32;

/// Serialize a value and append a keyed BLAKE2b tag over it.
///
/// Tokens produced by this function are authenticated, not encrypted; don't
/// put secrets in them.
pub fn sign<T>(key: &[u8], value: T) -> Result<Vec<u8>, SigningError>
where
    T: Serialize,
{
    let mut data = Vec::new();
    value.serialize(&mut rmps::Serializer::new(&mut data))
        .map_err(SigningError::Serialization)?;

    let tag = blake2b(TAG_LENGTH, key, &data);
    data.extend_from_slice(tag.as_bytes());

    Ok(data)
}

/// Verify a signed token and deserialize the value carried in it.
pub fn verify<T>(key: &[u8], data: &[u8]) -> Result<T, VerificationError>
where
    T: DeserializeOwned,
{
    if data.len() < TAG_LENGTH {
        return Err(VerificationError::TooShort);
    }

    let (payload, tag) = data.split_at(data.len() - TAG_LENGTH);
    let expected = blake2b(TAG_LENGTH, key, payload);

    // Compare hashes of both tags instead of the tags themselves to keep
    // the comparison independent of where the first difference is.
    if blake2b(TAG_LENGTH, &[], expected.as_bytes())
            != blake2b(TAG_LENGTH, &[], tag) {
        return Err(VerificationError::BadSignature);
    }

    rmps::from_slice(payload).map_err(VerificationError::Serialization)
}

#[derive(Debug, Fail)]
pub enum SigningError {
    #[fail(display = "could not serialize: {}", _0)]
    Serialization(#[cause] rmps::encode::Error),
}

#[derive(Debug, Fail)]
pub enum VerificationError {
    #[fail(display = "could not deserialize: {}", _0)]
    Serialization(#[cause] rmps::decode::Error),
    #[fail(display = "token signature is not valid")]
    BadSignature,
    #[fail(display = "not enough data to verify")]
    TooShort,
}

/// Structure holding possibly uninitialized data.
///
/// This differs from other similar types found on crates.io in that it
/// doesn't lock or synchronise access in any way, instead assuming it is safe
/// to initialize the value multiple times, and only keep one result.
#[derive(Debug)]
pub struct SingleInit<T> {
    cell: AtomicUsize,
    _type: PhantomData<T>,
}

impl<T> SingleInit<T> {
    /// Create a new uninitialized atomic cell.
    pub const fn uninit() -> Self {
        SingleInit {
            cell: AtomicUsize::new(0),
            _type: PhantomData,
        }
    }
}

impl<T> SingleInit<T>
where
    T: Sync,
    Self: 'static,
{
    /// Get stored value, or `None` if it hasn't been initialized yet.
    pub fn get(&self) -> Option<&'static T> {
        let ptr = self.cell.load(Ordering::Relaxed);

        if ptr != 0 {
            Some(unsafe { &*(ptr as *const T) })
        } else {
            None
        }
    }

    /// Get stored value, initializing it if necessary.
    pub fn get_or_init<F>(&self, init: F) -> &'static T
    where
        F: FnOnce() -> T,
    {
        self.get_or_try_init::<(), _>(|| Ok(init())).unwrap()
    }

    /// Same as [`SingleInit::get_or_init`] except that the initialisation
    /// function can fail.
    ///
    /// If the initialisation function fails the value will be unchanged, and
    /// another thread (or the same thread) can safely attempt to initialise
    /// it again.
    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<&'static T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let ptr = self.cell.load(Ordering::Relaxed);

        if ptr != 0 {
            return Ok(unsafe { &*(ptr as *const T) });
        }

        // Create a new value, place it on the heap, obtain a reference to it,
        // and prevent the destructor from running.
        let value = Box::leak(Box::new(init()?)) as *mut T;

        // Try to update the cell.
        let old = self.cell.compare_and_swap(ptr, value as usize, Ordering::Relaxed);

        if old == ptr {
            // Update succeeded, value is now the value of cell.
            Ok(unsafe { &*value })
        } else {
            // Update failed, cell was initialised by another thread. In this
            // case we drop value and return old.
            std::mem::drop(unsafe { Box::from_raw(value) });
            Ok(unsafe { &*(old as *const T) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{sign, verify, VerificationError};

    #[test]
    fn signed_tokens_round_trip() {
        let token = sign(b"test key", 198_276_354).unwrap();
        let value: i32 = verify(b"test key", &token).unwrap();
        assert_eq!(value, 198_276_354);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let mut token = sign(b"test key", 198_276_354).unwrap();
        token[0] ^= 0x01;

        match verify::<i32>(b"test key", &token) {
            Err(VerificationError::BadSignature) => (),
            r => panic!("expected BadSignature, got {:?}", r),
        }
    }

    #[test]
    fn keys_are_not_interchangeable() {
        let token = sign(b"test key", 198_276_354).unwrap();

        match verify::<i32>(b"other key", &token) {
            Err(VerificationError::BadSignature) => (),
            r => panic!("expected BadSignature, got {:?}", r),
        }
    }

    #[test]
    fn short_tokens_are_rejected() {
        match verify::<i32>(b"test key", b"too short") {
            Err(VerificationError::TooShort) => (),
            r => panic!("expected TooShort, got {:?}", r),
        }
    }
}
