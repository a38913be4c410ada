//! Integration tests for pbbot-common crate.

use pbbot_common::{humanize_list, plural, ChannelId, GuildId, UserId};
use std::collections::HashMap;

#[test]
fn test_identity_display() {
    assert_eq!(format!("{}", GuildId(42)), "42");
    assert_eq!(format!("{}", UserId(987654321)), "987654321");
    assert_eq!(format!("{}", ChannelId(123456789)), "123456789");
}

#[test]
fn test_identities_serialize_as_plain_numbers() {
    let user_id = UserId(987654321);
    let serialized = serde_json::to_string(&user_id).unwrap();
    assert_eq!(serialized, "987654321");

    let deserialized: UserId = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized, user_id);
}

#[test]
fn test_identities_as_map_keys() {
    let mut map = HashMap::new();
    map.insert(GuildId(1), "first");
    map.insert(GuildId::from(2), "second");
    assert_eq!(map.get(&GuildId(2)), Some(&"second"));
}

#[test]
fn test_reply_helpers() {
    assert_eq!(humanize_list(&["pb", "?"]), "`pb` and `?`");
    assert_eq!(plural(2, "use"), "uses");
}
