//! Rendering of keys into `authorized_keys` lines.
//!
//! A line looks like:
//!
//! ```text
//! command="gatehouse-serve alice",no-port-forwarding,no-X11-forwarding,no-agent-forwarding,no-pty ssh-ed25519 AAAA... alice@laptop gatehouse-key=alice/6c6170746f70
//! ```
//!
//! The trailing `gatehouse-key=` marker lands in the comment field, which sshd
//! ignores. It carries the owner and the hex encoded key name, so keys with
//! the same content but different names map to different lines.

use super::{Key, KeyId};

/// Marker prefix identifying lines managed by gatehouse.
pub const KEY_MARKER: &str = "gatehouse-key=";

/// Restrictions applied to every managed key.
pub const KEY_RESTRICTIONS: &str = "no-port-forwarding,no-X11-forwarding,no-agent-forwarding,no-pty";

/// Encode `key`, owned by `user`, into a single `authorized_keys` line.
///
/// `command` is the program sshd runs instead of a shell; it receives the
/// user name as its only argument. The returned line has no trailing newline;
/// line breaks inside the content are folded into spaces so that every
/// emitted line carries both the restrictions and the marker.
pub fn encode(user: &str, key: &Key, command: &str) -> String {
    let content = key
        .content
        .trim_end_matches(['\r', '\n'])
        .replace(['\r', '\n'], " ");
    format!(
        "command=\"{command} {user}\",{KEY_RESTRICTIONS} {content} {}",
        marker(&KeyId::new(user, key.name.as_str()))
    )
}

/// The marker token for `id`.
pub fn marker(id: &KeyId) -> String {
    format!("{KEY_MARKER}{}/{}", id.user, hex::encode(id.key.as_bytes()))
}

/// Recover the [`KeyId`] from a line produced by [`encode`].
///
/// Returns `None` for lines without a well-formed marker, such as entries an
/// administrator added by hand.
pub fn parse_key_id(line: &str) -> Option<KeyId> {
    let token = line.split_whitespace().next_back()?;
    let tagged = token.strip_prefix(KEY_MARKER)?;
    let (user, hex_name) = tagged.split_once('/')?;
    if user.is_empty() {
        return None;
    }
    let name = hex::decode(hex_name).ok()?;
    let name = String::from_utf8(name).ok()?;
    Some(KeyId::new(user, name))
}
