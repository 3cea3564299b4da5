use super::common::*;
use crate::workflows::applications::{
    ApplicationId, ApplicationQuery, ApplicationSort, ApplicationStatus, ApplicationStore,
    InMemoryApplicationStore, StoreError,
};
use crate::workflows::marketplace::{CandidateId, CompanyId, JobId};

fn populated() -> InMemoryApplicationStore {
    let store = InMemoryApplicationStore::new();

    let mut first = record("app-000001", ApplicationStatus::Pending);
    first.applied_at = at(8);

    let mut second = record("app-000002", ApplicationStatus::Approved);
    second.applied_at = at(12);
    second.job.company_id = CompanyId::new(GLOBEX);
    second.job.company_name = "Globex".to_string();
    second.job.title = "Data Scientist".to_string();

    let mut third = record("app-000003", ApplicationStatus::Rejected);
    third.applied_at = at(12);
    third.candidate_id = CandidateId::new(OMAR);
    third.candidate_name = "Omar Ops".to_string();

    for entry in [first, second, third] {
        store.insert(entry).expect("insert succeeds");
    }
    store
}

fn ids(records: &[crate::workflows::applications::ApplicationRecord]) -> Vec<&str> {
    records.iter().map(|record| record.id.as_str()).collect()
}

#[test]
fn duplicate_job_candidate_pair_is_rejected() {
    let store = InMemoryApplicationStore::new();
    store
        .insert(record("app-1", ApplicationStatus::Pending))
        .expect("first insert");

    let mut again = record("app-2", ApplicationStatus::Pending);
    again.job.job_id = JobId::new("job-app-1");

    match store.insert(again) {
        Err(StoreError::DuplicateApplication {
            job_id,
            candidate_id,
        }) => {
            assert_eq!(job_id.as_str(), "job-app-1");
            assert_eq!(candidate_id.as_str(), DANA);
        }
        other => panic!("expected duplicate, got {other:?}"),
    }
    assert_eq!(store.len(), 1);
}

#[test]
fn reused_id_is_a_conflict_and_unknown_update_is_not_found() {
    let store = InMemoryApplicationStore::new();
    store
        .insert(record("app-1", ApplicationStatus::Pending))
        .expect("first insert");

    let mut clash = record("app-1", ApplicationStatus::Pending);
    clash.job.job_id = JobId::new("job-other");
    assert_eq!(
        store.insert(clash),
        Err(StoreError::Conflict(ApplicationId("app-1".to_string())))
    );

    assert_eq!(
        store.update(record("app-9", ApplicationStatus::Approved)),
        Err(StoreError::NotFound(ApplicationId("app-9".to_string())))
    );
}

#[test]
fn default_sort_is_newest_first_with_id_tiebreak() {
    let store = populated();
    let listed = store.list(&ApplicationQuery::default()).expect("list");
    assert_eq!(ids(&listed), vec!["app-000002", "app-000003", "app-000001"]);
}

#[test]
fn filters_combine() {
    let store = populated();

    let for_dana = store
        .list(&ApplicationQuery::for_candidate(CandidateId::new(DANA)))
        .expect("list");
    assert_eq!(ids(&for_dana), vec!["app-000002", "app-000001"]);

    let acme_pending = store
        .list(&ApplicationQuery {
            status: Some(ApplicationStatus::Pending),
            ..ApplicationQuery::for_company(CompanyId::new(ACME))
        })
        .expect("list");
    assert_eq!(ids(&acme_pending), vec!["app-000001"]);
}

#[test]
fn search_matches_title_company_and_candidate_case_insensitively() {
    let store = populated();
    let search = |term: &str| {
        let query = ApplicationQuery {
            search: Some(term.to_string()),
            ..ApplicationQuery::default()
        };
        let listed = store.list(&query).expect("list");
        ids(&listed)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
    };

    assert_eq!(search("data sci"), vec!["app-000002"]);
    assert_eq!(search("GLOBEX"), vec!["app-000002"]);
    assert_eq!(search("omar"), vec!["app-000003"]);
    assert_eq!(search("   ").len(), 3);
}

#[test]
fn status_and_company_sorts() {
    let store = populated();

    let by_status = store
        .list(&ApplicationQuery {
            sort: ApplicationSort::Status,
            ..ApplicationQuery::default()
        })
        .expect("list");
    assert_eq!(ids(&by_status), vec!["app-000002", "app-000001", "app-000003"]);

    let by_company = store
        .list(&ApplicationQuery {
            sort: ApplicationSort::CompanyName,
            ..ApplicationQuery::default()
        })
        .expect("list");
    assert_eq!(ids(&by_company), vec!["app-000001", "app-000003", "app-000002"]);
}

#[test]
fn projections_do_not_mutate_records() {
    let store = populated();
    let before = store
        .fetch(&ApplicationId("app-000001".to_string()))
        .expect("fetch")
        .expect("present");

    let _ = store.list(&ApplicationQuery {
        sort: ApplicationSort::CompanyName,
        search: Some("acme".to_string()),
        ..ApplicationQuery::default()
    });

    let after = store
        .fetch(&ApplicationId("app-000001".to_string()))
        .expect("fetch")
        .expect("present");
    assert_eq!(before, after);
}

#[test]
fn stats_count_per_status_over_the_filter() {
    let store = populated();

    let all = store.stats(&ApplicationQuery::default()).expect("stats");
    assert_eq!(all.total, 3);
    assert_eq!(all.count(ApplicationStatus::Pending), 1);
    assert_eq!(all.count(ApplicationStatus::Approved), 1);
    assert_eq!(all.count(ApplicationStatus::Rejected), 1);
    assert_eq!(all.count(ApplicationStatus::Verified), 0);

    let acme = store
        .stats(&ApplicationQuery::for_company(CompanyId::new(ACME)))
        .expect("stats");
    assert_eq!(acme.total, 2);
    assert_eq!(acme.approved, 0);
}
