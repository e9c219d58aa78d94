use crate::resource::has_whitespace;
use mntsync_error::{MntsyncError, MntsyncResult};
use std::collections::BTreeSet;

/// Mount options as an order-insensitive set.
///
/// Members keep their first-seen order so the written form is stable across
/// runs; duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    members: Vec<String>,
}

impl OptionSet {
    /// Build from declared members. A member containing a comma is almost
    /// always a joined list passed where an array was required.
    pub fn from_list<I, S>(members: I) -> MntsyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for member in members {
            let member = member.into();
            if member.contains(',') {
                return Err(MntsyncError::validation(
                    "options",
                    "multiple options have to be specified as an array not a comma separated list",
                ));
            }
            if member.is_empty() || has_whitespace(&member) {
                return Err(MntsyncError::validation(
                    "options",
                    format!("option must not be empty or contain whitespace: {:?}", member),
                ));
            }
            set.push(member);
        }
        Ok(set)
    }

    /// Read the options column of an existing line. `-` means no options.
    pub fn from_field(field: &str) -> Self {
        let mut set = Self::default();
        if field == "-" {
            return set;
        }
        for member in field.split(',').filter(|m| !m.is_empty()) {
            set.push(member.to_string());
        }
        set
    }

    fn push(&mut self, member: String) {
        if !self.members.contains(&member) {
            self.members.push(member);
        }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Same members, ignoring order and duplicates.
    pub fn in_sync(&self, other: &OptionSet) -> bool {
        let a: BTreeSet<&str> = self.members.iter().map(String::as_str).collect();
        let b: BTreeSet<&str> = other.members.iter().map(String::as_str).collect();
        a == b
    }

    /// Column value; `empty` is written when there are no members.
    pub fn to_field(&self, empty: &str) -> String {
        if self.members.is_empty() {
            empty.to_string()
        } else {
            self.members.join(",")
        }
    }
}

/// Whether two declared option lists name the same set of options.
pub fn options_in_sync<A: AsRef<str>, B: AsRef<str>>(left: &[A], right: &[B]) -> bool {
    let a: BTreeSet<&str> = left.iter().map(AsRef::as_ref).collect();
    let b: BTreeSet<&str> = right.iter().map(AsRef::as_ref).collect();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_and_duplicates_do_not_matter() {
        assert!(options_in_sync(&["rw", "noatime", "nodev"], &["nodev", "rw", "noatime"]));
        assert!(options_in_sync(&["rw", "rw", "noatime"], &["noatime", "rw"]));
        assert!(options_in_sync::<&str, &str>(&[], &[]));
    }

    #[test]
    fn any_differing_member_is_out_of_sync() {
        assert!(!options_in_sync(&["rw", "noatime"], &["rw", "relatime"]));
        assert!(!options_in_sync(&["rw"], &["rw", "noatime"]));
        assert!(!options_in_sync(&["rw"], &[] as &[&str]));
    }

    #[test]
    fn comma_in_member_is_rejected() {
        let err = OptionSet::from_list(["rw,noatime"]).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn whitespace_in_member_is_rejected() {
        assert!(OptionSet::from_list(["no atime"]).is_err());
        assert!(OptionSet::from_list([""]).is_err());
    }

    #[test]
    fn field_round_trip_keeps_first_seen_order() {
        let set = OptionSet::from_list(["rw", "noatime", "rw"]).unwrap();
        assert_eq!(set.members(), &["rw".to_string(), "noatime".to_string()]);
        assert_eq!(set.to_field("-"), "rw,noatime");
        assert!(set.in_sync(&OptionSet::from_field("noatime,rw")));
    }

    #[test]
    fn dash_field_is_empty_set() {
        let set = OptionSet::from_field("-");
        assert!(set.is_empty());
        assert_eq!(set.to_field("-"), "-");
        assert_eq!(set.to_field("defaults"), "defaults");
    }
}
