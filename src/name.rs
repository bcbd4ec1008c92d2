//! # Unique naming
//! Cels and frames are addressed by name, unique within their owning library.
//! Both pools resolve requested names through [`reserve`]: empty requests get
//! a generated name, colliding requests get a random suffix appended, and the
//! outcome records how the final name was derived so hosts can tell a
//! user-chosen name from a machine-picked one.

/// Length of the generated name suffix, in characters.
pub const SUFFIX_LEN: usize = 8;

bitflags::bitflags! {
    /// How a reserved name was derived from the request.
    #[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
    pub struct NameFlags: u8 {
        /// The whole name was generated (empty or fallback-token request).
        const RANDOM = 1;
        /// A random suffix was appended to make the name free.
        const SUFFIXED = 1 << 1;
    }
}

/// Outcome of a reservation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Reserved {
    /// The entity already holds the requested name; nothing to do.
    Unchanged,
    /// A free name, not yet inserted into the pool by the caller.
    Fresh { name: String, flags: NameFlags },
}

/// Resolve a requested name against a pool.
///
/// `current` is the entity's existing name if it already lives in the pool
/// (re-requesting it is a no-op). `prefix` is the pool's fallback literal
/// (`"cel"` / `"frame"`); requesting the prefix itself, or the prefix with a
/// trailing dash, counts as requesting nothing. `taken` answers whether a
/// candidate is already in use and is consulted until a free name is found.
pub fn reserve(
    requested: &str,
    current: Option<&str>,
    prefix: &str,
    mut taken: impl FnMut(&str) -> bool,
) -> Reserved {
    let requested = if requested == prefix || requested.strip_suffix('-') == Some(prefix) {
        ""
    } else {
        requested
    };
    if !requested.is_empty() && Some(requested) == current {
        return Reserved::Unchanged;
    }
    if requested.is_empty() {
        let name = loop {
            let candidate = format!("{prefix}-{}", random_suffix());
            if !taken(&candidate) {
                break candidate;
            }
        };
        Reserved::Fresh {
            name,
            flags: NameFlags::RANDOM | NameFlags::SUFFIXED,
        }
    } else if taken(requested) {
        let name = loop {
            let candidate = format!("{requested}-{}", random_suffix());
            if !taken(&candidate) {
                break candidate;
            }
        };
        Reserved::Fresh {
            name,
            flags: NameFlags::SUFFIXED,
        }
    } else {
        Reserved::Fresh {
            name: requested.to_owned(),
            flags: NameFlags::empty(),
        }
    }
}

/// First [`SUFFIX_LEN`] hex digits of a fresh v4 UUID.
#[must_use]
pub fn random_suffix() -> String {
    let mut buf = uuid::Uuid::encode_buffer();
    let simple = uuid::Uuid::new_v4().simple().encode_lower(&mut buf);
    simple[..SUFFIX_LEN].to_owned()
}

/// Strip one `-XXXXXXXX` suffix off a name, if it is long enough to carry
/// one. Callers check the entity's [`NameFlags`] first; this does not guess.
#[must_use]
pub fn without_suffix(name: &str) -> &str {
    match name.len().checked_sub(SUFFIX_LEN + 1) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].starts_with('-') => &name[..cut],
        _ => name,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn never_taken(_: &str) -> bool {
        false
    }

    #[test]
    fn verbatim_when_free() {
        let got = reserve("sky", None, "cel", never_taken);
        assert_eq!(
            got,
            Reserved::Fresh {
                name: "sky".to_owned(),
                flags: NameFlags::empty(),
            }
        );
    }
    #[test]
    fn empty_request_generates() {
        let Reserved::Fresh { name, flags } = reserve("", None, "cel", never_taken) else {
            panic!("empty request must reserve");
        };
        assert_eq!(flags, NameFlags::RANDOM | NameFlags::SUFFIXED);
        let suffix = name.strip_prefix("cel-").unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
    #[test]
    fn fallback_token_counts_as_empty() {
        for request in ["frame", "frame-"] {
            let Reserved::Fresh { name, flags } = reserve(request, None, "frame", never_taken)
            else {
                panic!("fallback token must reserve");
            };
            assert!(name.starts_with("frame-"));
            assert!(flags.contains(NameFlags::RANDOM));
        }
    }
    #[test]
    fn taken_request_gets_suffix() {
        let Reserved::Fresh { name, flags } = reserve("sky", None, "cel", |n| n == "sky") else {
            panic!("collision must reserve");
        };
        assert_eq!(flags, NameFlags::SUFFIXED);
        assert_eq!(name.len(), "sky".len() + 1 + SUFFIX_LEN);
        assert!(name.starts_with("sky-"));
    }
    #[test]
    fn generation_loops_until_free() {
        // Refuse the first three suffixed candidates no matter what they are.
        let mut candidates = 0;
        let reserved = reserve("sky", None, "cel", |n| {
            if n == "sky" {
                true
            } else {
                candidates += 1;
                candidates <= 3
            }
        });
        assert_eq!(candidates, 4);
        let Reserved::Fresh { name, .. } = reserved else {
            panic!("must reserve eventually");
        };
        assert!(name.starts_with("sky-"));
    }
    #[test]
    fn own_name_is_unchanged() {
        assert_eq!(
            reserve("sky", Some("sky"), "cel", never_taken),
            Reserved::Unchanged
        );
        // A different current name still reserves.
        assert!(matches!(
            reserve("sky", Some("sea"), "cel", never_taken),
            Reserved::Fresh { .. }
        ));
    }
    #[test]
    fn suffix_strips_cleanly() {
        assert_eq!(without_suffix("sky-0a1b2c3d"), "sky");
        // Too short to carry a suffix, or no dash in the right spot.
        assert_eq!(without_suffix("sky"), "sky");
        assert_eq!(without_suffix("abcdefghi"), "abcdefghi");
    }
}
