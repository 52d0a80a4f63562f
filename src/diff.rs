//! Name-keyed diffing of nested topic and user collections
//!
//! The remote collection and the declared collection are treated as two sets
//! of names. Names only on the remote side are deleted, names only in the
//! declaration are added, and names on both sides are compared field by field.

use std::collections::HashSet;

use crate::adapters::flatten_topic;
use crate::api::{Topic, User};
use crate::changes::changed_spec_fields;
use crate::error::Result;
use crate::fieldmask::TOPIC_UPDATE_FIELDS;
use crate::resources::{KafkaTopicSpec, KafkaUserSpec};

/// Anything keyed by a name within its cluster
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Topic {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for KafkaTopicSpec {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for User {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for KafkaUserSpec {
    fn name(&self) -> &str {
        &self.name
    }
}

fn find_by_name<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

/// Whether two collections hold equal entries under the same names,
/// ignoring their order
pub fn same_by_name<T: Named + PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|item| find_by_name(b, item.name()) == Some(item))
}

/// Reorder `remote` in place so entries named in `target` take the target's
/// relative positions. For each target index, the first later remote entry
/// with the same name is swapped into that index.
pub fn align_by_name<R: Named, T: Named>(remote: &mut [R], target: &[T]) {
    for (i, wanted) in target.iter().enumerate() {
        if i >= remote.len() {
            break;
        }
        if remote[i].name() == wanted.name() {
            continue;
        }
        if let Some(offset) = remote[i + 1..]
            .iter()
            .position(|item| item.name() == wanted.name())
        {
            remote.swap(i, i + 1 + offset);
        }
    }
}

/// Names split by which side they appear on
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamePartition {
    /// Remote only, in remote order
    pub to_delete: Vec<String>,
    /// Target only, in target order
    pub to_add: Vec<String>,
    /// On both sides, in target order
    pub common: Vec<String>,
}

pub fn partition_by_name<R: Named, T: Named>(remote: &[R], target: &[T]) -> NamePartition {
    let remote_names: HashSet<&str> = remote.iter().map(Named::name).collect();
    let target_names: HashSet<&str> = target.iter().map(Named::name).collect();

    let to_delete = remote
        .iter()
        .map(Named::name)
        .filter(|name| !target_names.contains(name))
        .map(str::to_string)
        .collect();

    let (common, to_add) = target
        .iter()
        .map(Named::name)
        .partition::<Vec<&str>, _>(|name| remote_names.contains(name));

    NamePartition {
        to_delete,
        to_add: to_add.into_iter().map(str::to_string).collect(),
        common: common.into_iter().map(str::to_string).collect(),
    }
}

/// A topic present on both sides whose declared fields changed
#[derive(Clone, Debug, PartialEq)]
pub struct ModifiedTopic<'a> {
    pub spec: &'a KafkaTopicSpec,
    /// Changed declared fields, relative to the topic
    pub fields: Vec<&'static str>,
}

/// Topic actions, applied delete first, then add, then modify
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicChanges<'a> {
    pub to_delete: Vec<String>,
    pub to_add: Vec<&'a KafkaTopicSpec>,
    pub to_modify: Vec<ModifiedTopic<'a>>,
}

impl TopicChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty() && self.to_modify.is_empty()
    }
}

/// Declared topic fields that differ between two topic specs
pub fn changed_topic_fields(old: &KafkaTopicSpec, new: &KafkaTopicSpec) -> Result<Vec<&'static str>> {
    changed_spec_fields(TOPIC_UPDATE_FIELDS, old, new)
}

/// Diff the remote topics against the target declaration.
///
/// `remote` is aligned to `target` first. A common topic is compared against
/// its prior applied declaration when there is one, otherwise against the
/// declared view of the remote topic.
pub fn diff_topics<'a>(
    remote: &mut [Topic],
    prior: &[KafkaTopicSpec],
    target: &'a [KafkaTopicSpec],
    version: &str,
) -> Result<TopicChanges<'a>> {
    align_by_name(remote, target);
    let partition = partition_by_name(remote, target);

    let to_add = partition
        .to_add
        .iter()
        .filter_map(|name| find_by_name(target, name))
        .collect();

    let mut to_modify = Vec::new();
    for name in &partition.common {
        let Some(spec) = find_by_name(target, name) else {
            continue;
        };
        let fields = match find_by_name(prior, name) {
            Some(old) => changed_topic_fields(old, spec)?,
            None => match find_by_name(remote, name) {
                Some(topic) => changed_topic_fields(&flatten_topic(topic, version), spec)?,
                None => continue,
            },
        };
        if !fields.is_empty() {
            to_modify.push(ModifiedTopic { spec, fields });
        }
    }

    Ok(TopicChanges {
        to_delete: partition.to_delete,
        to_add,
        to_modify,
    })
}

/// A user present on both sides whose password or permissions changed
#[derive(Clone, Debug, PartialEq)]
pub struct UserUpdate<'a> {
    pub spec: &'a KafkaUserSpec,
    /// Subset of `password`, `permissions`
    pub fields: Vec<&'static str>,
}

/// User actions, applied delete first, then add, then update
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserChanges<'a> {
    pub to_delete: Vec<String>,
    pub to_add: Vec<&'a KafkaUserSpec>,
    pub to_update: Vec<UserUpdate<'a>>,
}

impl UserChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty() && self.to_update.is_empty()
    }
}

/// Which user sub-paths differ. Permissions compare as ordered lists.
pub fn changed_user_fields(old: &KafkaUserSpec, new: &KafkaUserSpec) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if old.password != new.password {
        fields.push("password");
    }
    if old.permissions != new.permissions {
        fields.push("permissions");
    }
    fields
}

/// Diff the remote users against the target declaration. Common users are
/// only updated when a prior applied declaration of the same name exists.
pub fn diff_users<'a>(
    remote: &[User],
    prior: &[KafkaUserSpec],
    target: &'a [KafkaUserSpec],
) -> UserChanges<'a> {
    let partition = partition_by_name(remote, target);

    let to_add = partition
        .to_add
        .iter()
        .filter_map(|name| find_by_name(target, name))
        .collect();

    let to_update = partition
        .common
        .iter()
        .filter_map(|name| {
            let spec = find_by_name(target, name)?;
            let old = find_by_name(prior, name)?;
            let fields = changed_user_fields(old, spec);
            (!fields.is_empty()).then_some(UserUpdate { spec, fields })
        })
        .collect();

    UserChanges {
        to_delete: partition.to_delete,
        to_add,
        to_update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{KafkaPermissionSpec, TopicSettingsSpec};

    fn topic_spec(name: &str, partitions: i64) -> KafkaTopicSpec {
        KafkaTopicSpec {
            name: name.to_string(),
            partitions,
            replication_factor: 1,
            topic_config: None,
        }
    }

    fn remote_topic(name: &str, partitions: i64) -> Topic {
        Topic {
            name: name.to_string(),
            cluster_id: "c1".to_string(),
            partitions: Some(partitions),
            replication_factor: Some(1),
            ..Default::default()
        }
    }

    fn user(name: &str, password: &str, perms: &[(&str, &str)]) -> KafkaUserSpec {
        KafkaUserSpec {
            name: name.to_string(),
            password: password.to_string(),
            permissions: perms
                .iter()
                .map(|(topic, role)| KafkaPermissionSpec {
                    topic_name: topic.to_string(),
                    role: role.to_string(),
                })
                .collect(),
        }
    }

    fn remote_user(name: &str) -> User {
        User {
            name: name.to_string(),
            cluster_id: "c1".to_string(),
            permissions: Vec::new(),
        }
    }

    fn names<T: Named>(items: &[T]) -> Vec<&str> {
        items.iter().map(Named::name).collect()
    }

    #[test]
    fn align_moves_matching_names_into_target_positions() {
        let mut remote = vec![remote_topic("c", 1), remote_topic("x", 1), remote_topic("a", 1)];
        let target = vec![topic_spec("a", 1), topic_spec("c", 1)];

        align_by_name(&mut remote, &target);

        assert_eq!(names(&remote), vec!["a", "c", "x"]);
    }

    #[test]
    fn align_tolerates_longer_target() {
        let mut remote = vec![remote_topic("b", 1)];
        let target = vec![topic_spec("a", 1), topic_spec("b", 1), topic_spec("c", 1)];

        align_by_name(&mut remote, &target);

        assert_eq!(names(&remote), vec!["b"]);
    }

    #[test]
    fn same_by_name_ignores_order() {
        let a = vec![topic_spec("a", 1), topic_spec("b", 2)];
        let b = vec![topic_spec("b", 2), topic_spec("a", 1)];
        assert!(same_by_name(&a, &b));
        assert!(!same_by_name(&a, &[topic_spec("a", 1), topic_spec("b", 3)]));
        assert!(!same_by_name(&a, &a[..1]));
    }

    #[test]
    fn partitions_are_disjoint_and_cover_both_sides() {
        let cases: Vec<(Vec<&str>, Vec<&str>)> = vec![
            (vec![], vec![]),
            (vec!["a"], vec![]),
            (vec![], vec!["a"]),
            (vec!["a", "b", "c"], vec!["b", "c", "d"]),
            (vec!["x", "y"], vec!["y", "x"]),
            (vec!["a", "b"], vec!["c", "d", "e"]),
        ];

        for (remote_names, target_names) in cases {
            let mut remote: Vec<Topic> = remote_names.iter().map(|n| remote_topic(n, 1)).collect();
            let target: Vec<KafkaTopicSpec> = target_names.iter().map(|n| topic_spec(n, 2)).collect();

            let changes = diff_topics(&mut remote, &[], &target, "2.8").unwrap();

            let deleted: HashSet<&str> = changes.to_delete.iter().map(String::as_str).collect();
            let added: HashSet<&str> = changes.to_add.iter().map(|t| t.name.as_str()).collect();
            let modified: HashSet<&str> = changes.to_modify.iter().map(|t| t.spec.name.as_str()).collect();

            assert!(deleted.is_disjoint(&added));
            assert!(deleted.is_disjoint(&modified));
            assert!(added.is_disjoint(&modified));

            let partition = partition_by_name(&remote, &target);
            let mut covered: HashSet<&str> = deleted.clone();
            covered.extend(added.iter());
            covered.extend(partition.common.iter().map(String::as_str));
            let expected: HashSet<&str> = remote_names.iter().chain(target_names.iter()).copied().collect();
            assert_eq!(covered, expected);
        }
    }

    #[test]
    fn identical_topics_report_no_changes() {
        let spec = KafkaTopicSpec {
            topic_config: Some(TopicSettingsSpec {
                retention_ms: Some(3_600_000),
                cleanup_policy: Some("CLEANUP_POLICY_DELETE".to_string()),
                ..Default::default()
            }),
            ..topic_spec("events", 3)
        };

        assert!(changed_topic_fields(&spec, &spec.clone()).unwrap().is_empty());

        let mut remote = vec![remote_topic("events", 3)];
        let target = vec![spec.clone()];
        let changes = diff_topics(&mut remote, &target, &target, "2.8").unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn modified_topic_carries_changed_fields() {
        let prior = vec![topic_spec("events", 3)];
        let target = vec![KafkaTopicSpec {
            topic_config: Some(TopicSettingsSpec {
                retention_ms: Some(1000),
                ..Default::default()
            }),
            ..topic_spec("events", 6)
        }];
        let mut remote = vec![remote_topic("events", 3)];

        let changes = diff_topics(&mut remote, &prior, &target, "2.8").unwrap();

        assert_eq!(changes.to_modify.len(), 1);
        assert_eq!(
            changes.to_modify[0].fields,
            vec!["partitions", "topic_config.retention_ms"]
        );
    }

    #[test]
    fn remote_view_is_used_without_prior_declaration() {
        let target = vec![topic_spec("events", 3)];
        let mut remote = vec![remote_topic("events", 5)];

        let changes = diff_topics(&mut remote, &[], &target, "2.8").unwrap();

        assert_eq!(changes.to_modify[0].fields, vec!["partitions"]);
    }

    #[test]
    fn replacing_one_topic_deletes_and_adds_only() {
        let prior = vec![topic_spec("keep", 1), topic_spec("old", 1)];
        let target = vec![topic_spec("keep", 1), topic_spec("new", 1)];
        let mut remote = vec![remote_topic("keep", 1), remote_topic("old", 1)];

        let changes = diff_topics(&mut remote, &prior, &target, "2.8").unwrap();

        assert_eq!(changes.to_delete, vec!["old".to_string()]);
        let added: Vec<&str> = changes.to_add.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(added, vec!["new"]);
        assert!(changes.to_modify.is_empty());
    }

    #[test]
    fn password_only_change_updates_password() {
        let prior = vec![user("alice", "old-secret", &[("events", "ACCESS_ROLE_CONSUMER")])];
        let target = vec![user("alice", "new-secret", &[("events", "ACCESS_ROLE_CONSUMER")])];

        let changes = diff_users(&[remote_user("alice")], &prior, &target);

        assert_eq!(changes.to_update.len(), 1);
        assert_eq!(changes.to_update[0].fields, vec!["password"]);
    }

    #[test]
    fn permission_order_counts_as_change() {
        let prior = vec![user(
            "alice",
            "secret",
            &[("a", "ACCESS_ROLE_CONSUMER"), ("b", "ACCESS_ROLE_PRODUCER")],
        )];
        let target = vec![user(
            "alice",
            "secret",
            &[("b", "ACCESS_ROLE_PRODUCER"), ("a", "ACCESS_ROLE_CONSUMER")],
        )];

        let changes = diff_users(&[remote_user("alice")], &prior, &target);

        assert_eq!(changes.to_update[0].fields, vec!["permissions"]);
    }

    #[test]
    fn users_partition_by_name() {
        let prior = vec![user("alice", "a", &[]), user("bob", "b", &[])];
        let target = vec![user("bob", "b", &[]), user("carol", "c", &[])];
        let remote = vec![remote_user("alice"), remote_user("bob")];

        let changes = diff_users(&remote, &prior, &target);

        assert_eq!(changes.to_delete, vec!["alice".to_string()]);
        assert_eq!(changes.to_add.len(), 1);
        assert_eq!(changes.to_add[0].name, "carol");
        assert!(changes.to_update.is_empty());
    }

    #[test]
    fn common_user_without_prior_is_left_alone() {
        let target = vec![user("alice", "secret", &[])];

        let changes = diff_users(&[remote_user("alice")], &[], &target);

        assert!(changes.is_empty());
    }
}
