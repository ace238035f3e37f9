use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::entities::query::{
    Aggregates, QueryDescriptor, QueryError, QueryResult, SortDirection, SortSpec,
};
use crate::domain::entities::user::{
    display_value, is_date_field, parse_timestamp, stringify, value_instant, FieldValue,
    UserRecord,
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Instant(DateTime<Utc>),
    Text(String),
}

/// Search, filter, sort, aggregate and paginate `users` under `query`.
pub fn evaluate(users: &[UserRecord], query: &QueryDescriptor) -> Result<QueryResult, QueryError> {
    if query.page_size <= 0 {
        return Err(QueryError::InvalidArgument(format!(
            "page_size must be greater than zero, got {}",
            query.page_size
        )));
    }

    let matched = filter_and_sort(users, query);
    let aggregates = aggregate(&matched);
    let total_matched = matched.len();

    let page_size = query.page_size as usize;
    let page_count = total_matched.div_ceil(page_size).max(1) as i64;
    let page = query.page.clamp(1, page_count);
    let start = (page as usize - 1) * page_size;
    let items = matched.into_iter().skip(start).take(page_size).collect();

    tracing::debug!(
        total_matched,
        page,
        page_count,
        "evaluated user directory query"
    );

    Ok(QueryResult {
        items,
        total_matched,
        page,
        page_count,
        aggregates,
    })
}

/// The searched, filtered and sorted set before pagination.
pub fn filter_and_sort(users: &[UserRecord], query: &QueryDescriptor) -> Vec<UserRecord> {
    let term = query.search_text.to_lowercase();
    let filters: Vec<(&str, String)> = query
        .column_filters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| (field.as_str(), value.to_lowercase()))
        .collect();

    let mut matched: Vec<UserRecord> = users
        .iter()
        .filter(|user| term.is_empty() || matches_search(user, &term))
        .filter(|user| {
            filters
                .iter()
                .all(|(field, value)| stringify(user, field).to_lowercase() == *value)
        })
        .cloned()
        .collect();

    sort_records(&mut matched, &query.sort);
    matched
}

fn matches_search(user: &UserRecord, term: &str) -> bool {
    user.search_values()
        .any(|value| value.to_lowercase().contains(term))
}

pub fn aggregate(users: &[UserRecord]) -> Aggregates {
    Aggregates {
        total_users: users.len(),
        active_users: users.iter().filter(|user| user.is_active()).count(),
        total_admins: users.iter().filter(|user| user.is_admin()).count(),
    }
}

fn sort_records(users: &mut Vec<UserRecord>, sort: &SortSpec) {
    let Some(column) = sort.column.as_deref() else {
        return;
    };

    let by_instant = is_date_column(users, column);
    let mut keyed: Vec<(Option<SortKey>, UserRecord)> = users
        .drain(..)
        .map(|user| (sort_key(&user, column, by_instant), user))
        .collect();

    // `sort_by` is stable, so equal keys keep input order in both directions.
    keyed.sort_by(|(left, _), (right, _)| match sort.direction {
        SortDirection::Asc => compare_keys(left, right),
        SortDirection::Desc => compare_keys(right, left),
    });

    users.extend(keyed.into_iter().map(|(_, user)| user));
}

fn compare_keys(left: &Option<SortKey>, right: &Option<SortKey>) -> Ordering {
    // `None` orders before any `Some`, so missing values are lowest.
    left.cmp(right)
}

fn is_date_column(users: &[UserRecord], column: &str) -> bool {
    if is_date_field(column) {
        return true;
    }
    let mut present = users
        .iter()
        .filter_map(|user| user.get(column))
        .peekable();
    present.peek().is_some()
        && present.all(|value| matches!(value, FieldValue::Text(text) if parse_timestamp(text).is_some()))
}

fn sort_key(user: &UserRecord, column: &str, by_instant: bool) -> Option<SortKey> {
    if by_instant {
        return user.get(column).and_then(value_instant).map(SortKey::Instant);
    }
    display_value(user, column).map(SortKey::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::user::{FIELD_JOINED, FIELD_ROLE, FIELD_STATUS};

    fn tony_and_zoey() -> Vec<UserRecord> {
        vec![
            UserRecord::new("1")
                .with("name", "Tony")
                .with(FIELD_ROLE, "Admin")
                .with(FIELD_STATUS, "Active"),
            UserRecord::new("2")
                .with("name", "Zoey")
                .with(FIELD_ROLE, "Staff")
                .with(FIELD_STATUS, "Active"),
        ]
    }

    fn roster() -> Vec<UserRecord> {
        vec![
            UserRecord::new("a")
                .with("name", "Musa")
                .with("department", "Physics")
                .with("level", "Level 9")
                .with(FIELD_STATUS, "Active")
                .with(FIELD_JOINED, "2024-02-01T09:00:00Z"),
            UserRecord::new("b")
                .with("name", "Ada")
                .with("department", "Computer Science")
                .with("level", "Level 10")
                .with(FIELD_STATUS, "Pending")
                .with(FIELD_ROLE, "Admin")
                .with(FIELD_JOINED, 1_700_000_000_i64),
            UserRecord::new("c")
                .with("name", "Kemi")
                .with("department", "Physics")
                .with(FIELD_STATUS, "Inactive"),
            UserRecord::new("d")
                .with("name", "Ada")
                .with("department", "Physics")
                .with("level", "Level 9")
                .with(FIELD_STATUS, "Active")
                .with(FIELD_JOINED, "bad date"),
            UserRecord::new("e")
                .with("name", "Ada")
                .with("email", "ada.e@uni.edu")
                .with(FIELD_STATUS, "Active")
                .with(FIELD_JOINED, "2023-06-15"),
        ]
    }

    fn keys(users: &[UserRecord]) -> Vec<&str> {
        users.iter().map(|user| user.key.as_str()).collect()
    }

    fn query(page: i64, page_size: i64) -> QueryDescriptor {
        QueryDescriptor {
            page,
            page_size,
            ..QueryDescriptor::default()
        }
    }

    #[test]
    fn sorts_by_name_and_counts_aggregates() {
        let users = tony_and_zoey();
        let q = QueryDescriptor {
            sort: SortSpec::by("name", SortDirection::Asc),
            ..query(1, 10)
        };

        let result = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(keys(&result.items), vec!["1", "2"]);
        assert_eq!(
            result.aggregates,
            Aggregates {
                total_users: 2,
                active_users: 2,
                total_admins: 1
            }
        );
        assert_eq!(result.page_count, 1);
        assert_eq!(result.total_matched, 2);
    }

    #[test]
    fn second_page_of_size_one() {
        let users = tony_and_zoey();
        let result = evaluate(&users, &query(2, 1)).expect("query should succeed");

        assert_eq!(keys(&result.items), vec!["2"]);
        assert_eq!(result.page_count, 2);
    }

    #[test]
    fn column_filter_is_case_insensitive_equality() {
        let users = tony_and_zoey();
        let q = query(1, 10).with_filter("role", "admin");

        let result = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(keys(&result.items), vec!["1"]);
    }

    #[test]
    fn column_filter_does_not_match_substrings() {
        let users = roster();
        let q = query(1, 10).with_filter("department", "phys");

        let result = evaluate(&users, &q).expect("query should succeed");

        assert!(result.items.is_empty());
        assert_eq!(result.page_count, 1);
    }

    #[test]
    fn filters_compose_and_ignore_empty_values() {
        let users = roster();
        let q = query(1, 10)
            .with_filter("department", "PHYSICS")
            .with_filter("status", "active")
            .with_filter("level", "");

        let result = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(keys(&result.items), vec!["a", "d"]);
    }

    #[test]
    fn default_role_matches_user_filter() {
        let users = roster();
        let q = query(1, 10).with_filter("role", "user");

        let result = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(keys(&result.items), vec!["a", "c", "d", "e"]);
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let users = tony_and_zoey();
        let err = evaluate(&users, &query(1, 0)).expect_err("page size 0 should fail");
        assert!(matches!(err, QueryError::InvalidArgument(_)));

        let err = evaluate(&users, &query(1, -3)).expect_err("negative page size should fail");
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn page_is_clamped_into_range() {
        let users = roster();

        let low = evaluate(&users, &query(0, 2)).expect("query should succeed");
        assert_eq!(low.page, 1);
        assert_eq!(keys(&low.items), vec!["a", "b"]);

        let high = evaluate(&users, &query(99, 2)).expect("query should succeed");
        assert_eq!(high.page, 3);
        assert_eq!(keys(&high.items), vec!["e"]);
    }

    #[test]
    fn empty_input_has_one_empty_page() {
        let result = evaluate(&[], &query(4, 10)).expect("query should succeed");
        assert!(result.items.is_empty());
        assert_eq!(result.page, 1);
        assert_eq!(result.page_count, 1);
        assert_eq!(result.aggregates, Aggregates::default());
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let users = roster();
        let q = QueryDescriptor {
            search_text: "ADA.E@".to_string(),
            ..query(1, 10)
        };

        let result = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(keys(&result.items), vec!["e"]);
    }

    #[test]
    fn search_reads_formatted_values() {
        let users = roster();
        let q = QueryDescriptor {
            search_text: "2023-11-14".to_string(),
            ..query(1, 10)
        };

        let result = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(keys(&result.items), vec!["b"]);
    }

    #[test]
    fn search_never_shrinks_below_empty_term() {
        let users = roster();
        let all = evaluate(&users, &query(1, 10)).expect("query should succeed");
        for term in ["a", "physics", "zzz", "Level 1"] {
            let q = QueryDescriptor {
                search_text: term.to_string(),
                ..query(1, 10)
            };
            let some = evaluate(&users, &q).expect("query should succeed");
            assert!(all.total_matched >= some.total_matched, "term {term}");
        }
    }

    #[test]
    fn equal_keys_keep_input_order_in_both_directions() {
        let users = roster();

        let asc = filter_and_sort(
            &users,
            &QueryDescriptor {
                sort: SortSpec::by("name", SortDirection::Asc),
                ..query(1, 10)
            },
        );
        assert_eq!(keys(&asc), vec!["b", "d", "e", "c", "a"]);

        let desc = filter_and_sort(
            &users,
            &QueryDescriptor {
                sort: SortSpec::by("name", SortDirection::Desc),
                ..query(1, 10)
            },
        );
        assert_eq!(keys(&desc), vec!["a", "c", "b", "d", "e"]);
    }

    #[test]
    fn date_columns_sort_by_instant_with_missing_lowest() {
        let users = roster();
        let q = QueryDescriptor {
            sort: SortSpec::by(FIELD_JOINED, SortDirection::Asc),
            ..query(1, 10)
        };

        let sorted = filter_and_sort(&users, &q);

        // c has no date and d cannot be parsed; both rank lowest in input order.
        assert_eq!(keys(&sorted), vec!["c", "d", "e", "b", "a"]);
    }

    #[test]
    fn timestamp_text_columns_sort_by_instant() {
        let users = vec![
            UserRecord::new("1").with("verifiedAt", "2024-01-02T00:00:00+05:00"),
            UserRecord::new("2").with("verifiedAt", "2024-01-01T23:00:00Z"),
            UserRecord::new("3"),
        ];
        let q = QueryDescriptor {
            sort: SortSpec::by("verifiedAt", SortDirection::Desc),
            ..query(1, 10)
        };

        let sorted = filter_and_sort(&users, &q);

        assert_eq!(keys(&sorted), vec!["2", "1", "3"]);
    }

    #[test]
    fn text_columns_sort_lexically() {
        let users = roster();
        let q = QueryDescriptor {
            sort: SortSpec::by("level", SortDirection::Asc),
            ..query(1, 10)
        };

        let sorted = filter_and_sort(&users, &q);

        assert_eq!(keys(&sorted), vec!["c", "e", "b", "a", "d"]);
    }

    #[test]
    fn pages_concatenate_to_the_full_ordering() {
        let users = roster();
        let base = QueryDescriptor {
            search_text: "a".to_string(),
            sort: SortSpec::by("name", SortDirection::Desc),
            ..query(1, 2)
        };
        let full = filter_and_sort(&users, &base);
        let first = evaluate(&users, &base).expect("query should succeed");

        let mut collected = Vec::new();
        for page in 1..=first.page_count {
            let q = QueryDescriptor {
                page,
                ..base.clone()
            };
            collected.extend(evaluate(&users, &q).expect("query should succeed").items);
        }

        assert_eq!(collected, full);
        assert_eq!(first.aggregates.total_users, first.total_matched);
    }

    #[test]
    fn aggregates_follow_the_filtered_set() {
        let users = roster();
        let q = query(1, 1).with_filter("name", "ada");

        let result = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(result.total_matched, 3);
        assert_eq!(result.aggregates.total_users, 3);
        assert_eq!(result.aggregates.active_users, 2);
        assert_eq!(result.aggregates.total_admins, 1);
        assert_eq!(result.items.len(), 1);
    }

    #[test]
    fn evaluate_is_repeatable_and_leaves_input_untouched() {
        let users = roster();
        let snapshot = users.clone();
        let q = QueryDescriptor {
            search_text: "physics".to_string(),
            sort: SortSpec::by("name", SortDirection::Asc),
            ..query(1, 10)
        };

        let first = evaluate(&users, &q).expect("query should succeed");
        let second = evaluate(&users, &q).expect("query should succeed");

        assert_eq!(first, second);
        assert_eq!(users, snapshot);
    }
}
