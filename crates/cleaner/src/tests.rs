// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::{sync::Arc, time::Duration};

use qbc_data_model::{CleanupType, MockClock, QuestionVersionStatus};
use qbc_storage::{InMemorySessionStore, InMemoryStatisticsCache, QuestionScope};

use crate::{
    Cleaner, CleanerOptions,
    mock::{MockData, MockRepositoryFactory},
};

fn cleaner_with_clock(factory: &MockRepositoryFactory) -> (Cleaner, Arc<MockClock>) {
    let clock = Arc::new(MockClock::default());
    let cleaner = Cleaner::new(
        Arc::new(factory.clone()),
        Arc::clone(&clock) as Arc<dyn qbc_data_model::Clock>,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(InMemoryStatisticsCache::new()),
        CleanerOptions {
            throttle: Duration::ZERO,
            ..CleanerOptions::default()
        },
    );
    (cleaner, clock)
}

fn cleaner(factory: &MockRepositoryFactory) -> Cleaner {
    cleaner_with_clock(factory).0
}

/// Two used questions, three unused ones, a couple of answers
fn mixed_bank() -> MockData {
    let mut data = MockData::new();
    for id in 1..=5 {
        data.add_question(id, &format!("Q{id}"), "truefalse", &format!("body {id}"));
        data.add_answer(id * 10, id, "True");
    }
    data.add_quiz_reference(1);
    data.add_quiz_reference(2);
    data
}

#[tokio::test]
async fn counts_unused_questions() {
    let factory = MockRepositoryFactory::new(mixed_bank());
    let cleaner = cleaner(&factory);

    let count = cleaner
        .candidate_count(CleanupType::UnusedQuestions)
        .await
        .unwrap();
    assert_eq!(count, 3);

    let unused = cleaner
        .list_unused_questions(QuestionScope::new(), 100)
        .await
        .unwrap();
    let ids: Vec<i64> = unused.iter().map(|q| q.id.value()).collect();
    assert_eq!(ids, vec![3, 4, 5]);

    let used = cleaner
        .list_used_questions(QuestionScope::new(), 0, 100)
        .await
        .unwrap();
    let ids: Vec<i64> = used.iter().map(|q| q.id.value()).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn hidden_and_draft_versions_are_excluded() {
    let mut data = MockData::new();
    data.add_question(1, "Q1", "truefalse", "x");
    data.add_question(2, "Q2", "truefalse", "x");
    data.add_question(3, "Q3", "truefalse", "x");
    data.add_question(4, "Q4", "truefalse", "x");

    // Q2's only version is a draft, Q4's only version is hidden
    data.versions.get_mut(&2).unwrap().status = QuestionVersionStatus::Draft;
    data.versions.get_mut(&4).unwrap().status = QuestionVersionStatus::Hidden;
    // Q3 has a newer hidden version; the ready one stays current
    data.add_version(103, 3, 3, 2, QuestionVersionStatus::Hidden);

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    let unused = cleaner
        .list_unused_questions(QuestionScope::new(), 100)
        .await
        .unwrap();
    let ids: Vec<i64> = unused.iter().map(|q| q.id.value()).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn scope_restricts_to_one_context() {
    let mut data = MockData::new();
    data.add_category(2, "Course B", 20);
    data.add_question(1, "Q1", "truefalse", "x");
    data.add_question_in_category(2, "Q2", "truefalse", "y", 2);

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    let scoped = cleaner
        .list_unused_questions(
            QuestionScope::new().in_context(qbc_data_model::ContextId(20)),
            100,
        )
        .await
        .unwrap();
    let ids: Vec<i64> = scoped.iter().map(|q| q.id.value()).collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn duplicate_groups_keep_the_oldest_member() {
    let mut data = MockData::new();
    for id in [10, 11, 12, 13, 14] {
        data.add_question(id, "Same", "truefalse", "body");
    }
    data.add_question(20, "Other", "truefalse", "body");

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    let groups = cleaner.duplicate_groups(100).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].keeper().id.value(), 10);
    assert_eq!(groups[0].deletable().count(), 4);

    let count = cleaner
        .candidate_count(CleanupType::DuplicateQuestions)
        .await
        .unwrap();
    assert_eq!(count, 4);
}

#[tokio::test]
async fn duplicate_cleanup_in_two_batches() {
    let mut data = MockData::new();
    for id in [10, 11, 12, 13, 14] {
        data.add_question(id, "Same", "truefalse", "body");
        data.add_answer(id * 10, id, "True");
    }

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    let start = cleaner
        .start_session("alice", CleanupType::DuplicateQuestions, Some(2), None)
        .await
        .unwrap();
    assert_eq!(start.total, 4);
    assert_eq!(start.batch_size, 2);
    assert_eq!(start.total_batches, 2);

    let first = cleaner
        .process_batch("alice", CleanupType::DuplicateQuestions, Some(2), 1)
        .await
        .unwrap();
    assert_eq!(first.deleted, 2);
    assert_eq!(first.remaining, 2);
    assert!(!first.done);

    let second = cleaner
        .process_batch("alice", CleanupType::DuplicateQuestions, Some(2), 2)
        .await
        .unwrap();
    assert_eq!(second.deleted, 2);
    assert_eq!(second.remaining, 0);
    assert!(second.done);

    let data = factory.snapshot();
    let remaining: Vec<i64> = data.questions.keys().copied().collect();
    assert_eq!(remaining, vec![10]);
    // Dependent rows of the deleted questions are gone too
    let answers: Vec<i64> = data.answers.keys().copied().collect();
    assert_eq!(answers, vec![100]);
    assert_eq!(data.versions.len(), 1);
    assert_eq!(data.entries.len(), 1);
}

#[tokio::test]
async fn repeating_a_batch_number_never_deletes_a_row_twice() {
    let mut data = MockData::new();
    for id in [10, 11, 12, 13, 14] {
        data.add_question(id, "Same", "truefalse", "body");
    }

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    cleaner
        .start_session("alice", CleanupType::DuplicateQuestions, Some(2), None)
        .await
        .unwrap();

    let first = cleaner
        .process_batch("alice", CleanupType::DuplicateQuestions, Some(2), 1)
        .await
        .unwrap();
    assert_eq!(first.deleted, 2);
    assert_eq!(first.remaining, 2);

    // Repeating batch 1 is not a replay of the same rows: candidates
    // are recomputed, so it continues with the ones still left
    let repeated = cleaner
        .process_batch("alice", CleanupType::DuplicateQuestions, Some(2), 1)
        .await
        .unwrap();
    assert_eq!(repeated.batch_number, 1);
    assert_eq!(repeated.deleted, 2);
    assert_eq!(repeated.remaining, 0);
    assert!(repeated.done);

    // Only the keeper survives; each duplicate was deleted exactly once
    let remaining: Vec<i64> = factory.snapshot().questions.keys().copied().collect();
    assert_eq!(remaining, vec![10]);

    // With the list exhausted, yet another repeat deletes nothing and
    // is not an error
    let exhausted = cleaner
        .process_batch("alice", CleanupType::DuplicateQuestions, Some(2), 1)
        .await
        .unwrap();
    assert_eq!(exhausted.deleted, 0);
    assert_eq!(exhausted.remaining, 0);
    assert!(exhausted.done);
    assert!(exhausted.errors.is_empty());
}

#[tokio::test]
async fn candidate_that_becomes_used_survives_deletion() {
    let mut data = MockData::new();
    for id in [10, 11, 12] {
        data.add_question(id, "Same", "truefalse", "body");
    }

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    cleaner
        .start_session("alice", CleanupType::DuplicateQuestions, Some(10), None)
        .await
        .unwrap();

    // Someone puts one duplicate into a quiz between start and process
    factory.mutate(|data| data.add_quiz_reference(11));

    let report = cleaner
        .process_batch("alice", CleanupType::DuplicateQuestions, Some(10), 1)
        .await
        .unwrap();
    assert_eq!(report.deleted, 1);

    let remaining: Vec<i64> = factory.snapshot().questions.keys().copied().collect();
    assert_eq!(remaining, vec![10, 11]);
}

#[tokio::test]
async fn duplicate_of_a_deleted_keeper_is_regrouped() {
    let mut data = MockData::new();
    for id in [10, 11, 12] {
        data.add_question(id, "Same", "truefalse", "body");
    }

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    cleaner
        .start_session("alice", CleanupType::DuplicateQuestions, Some(10), None)
        .await
        .unwrap();

    // The keeper disappears before the batch runs; 11 becomes the new
    // keeper and must survive
    factory.mutate(|data| {
        data.questions.remove(&10);
        data.versions.remove(&10);
        data.entries.remove(&10);
    });

    let report = cleaner
        .process_batch("alice", CleanupType::DuplicateQuestions, Some(10), 1)
        .await
        .unwrap();
    assert_eq!(report.deleted, 1);

    let remaining: Vec<i64> = factory.snapshot().questions.keys().copied().collect();
    assert_eq!(remaining, vec![11]);
}

#[tokio::test]
async fn stop_request_skips_the_batch() {
    let factory = MockRepositoryFactory::new(mixed_bank());
    let cleaner = cleaner(&factory);

    cleaner
        .start_session("alice", CleanupType::UnusedQuestions, Some(10), None)
        .await
        .unwrap();
    cleaner.stop_session("alice").await;
    assert!(cleaner.session_status("alice").await.stop_requested);

    let report = cleaner
        .process_batch("alice", CleanupType::UnusedQuestions, Some(10), 1)
        .await
        .unwrap();
    assert!(report.stopped);
    assert_eq!(report.deleted, 0);
    assert_eq!(factory.snapshot().questions.len(), 5);

    // A new start clears the flag
    cleaner
        .start_session("alice", CleanupType::UnusedQuestions, Some(10), None)
        .await
        .unwrap();
    assert!(!cleaner.session_status("alice").await.stop_requested);
}

#[tokio::test]
async fn stop_flags_are_scoped_to_the_actor() {
    let factory = MockRepositoryFactory::new(mixed_bank());
    let cleaner = cleaner(&factory);

    cleaner.stop_session("alice").await;
    assert!(cleaner.session_status("alice").await.stop_requested);
    assert!(!cleaner.session_status("bob").await.stop_requested);
}

#[tokio::test]
async fn failed_chunk_rolls_back_and_is_reported() {
    let mut data = mixed_bank();
    data.fail_delete_questions = true;

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    let report = cleaner
        .process_batch("alice", CleanupType::UnusedQuestions, Some(10), 1)
        .await
        .unwrap();
    assert_eq!(report.deleted, 0);
    assert_eq!(report.failed, 3);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("injected failure"));

    // The whole chunk was rolled back: the dependent answer rows are
    // still there as well
    let data = factory.snapshot();
    assert_eq!(data.questions.len(), 5);
    assert_eq!(data.answers.len(), 5);
    assert_eq!(data.versions.len(), 5);
}

#[tokio::test]
async fn orphaned_answers_are_deleted() {
    let mut data = MockData::new();
    data.add_question(1, "Q1", "truefalse", "x");
    data.add_quiz_reference(1);
    data.add_answer(10, 1, "True");
    // Parent rows 98 and 99 do not exist
    data.add_answer(20, 98, "Stale");
    data.add_answer(21, 99, "Stale");

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    assert_eq!(
        cleaner
            .candidate_count(CleanupType::OrphanedAnswers)
            .await
            .unwrap(),
        2
    );
    let listed = cleaner.list_orphaned_answers(100).await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|a| a.id.value()).collect();
    assert_eq!(ids, vec![20, 21]);

    let report = cleaner
        .run_single_batch(CleanupType::OrphanedAnswers, 100)
        .await
        .unwrap();
    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 0);

    let answers: Vec<i64> = factory.snapshot().answers.keys().copied().collect();
    assert_eq!(answers, vec![10]);
}

#[tokio::test]
async fn orphan_that_gets_its_question_back_survives() {
    let mut data = MockData::new();
    data.add_answer(20, 98, "Stale");
    data.add_answer(21, 99, "Stale");

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    cleaner
        .start_session("alice", CleanupType::OrphanedAnswers, Some(10), None)
        .await
        .unwrap();

    // A restore brings question 98 back before the batch runs
    factory.mutate(|data| data.add_question(98, "Restored", "truefalse", "x"));

    let report = cleaner
        .process_batch("alice", CleanupType::OrphanedAnswers, Some(10), 1)
        .await
        .unwrap();
    assert_eq!(report.deleted, 1);

    let answers: Vec<i64> = factory.snapshot().answers.keys().copied().collect();
    assert_eq!(answers, vec![20]);
}

#[tokio::test]
async fn unused_answers_leave_their_questions_in_place() {
    let mut data = MockData::new();
    data.add_question(1, "Q1", "truefalse", "x");
    data.add_question(2, "Q2", "truefalse", "y");
    data.add_quiz_reference(1);
    data.add_answer(10, 1, "True");
    data.add_answer(20, 2, "True");
    data.add_answer(21, 2, "False");

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    assert_eq!(
        cleaner
            .candidate_count(CleanupType::UnusedAnswers)
            .await
            .unwrap(),
        2
    );
    let listed = cleaner.list_unused_answers(100).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].question_name, "Q2");

    let report = cleaner
        .run_single_batch(CleanupType::UnusedAnswers, 100)
        .await
        .unwrap();
    assert_eq!(report.deleted, 2);

    let data = factory.snapshot();
    let answers: Vec<i64> = data.answers.keys().copied().collect();
    assert_eq!(answers, vec![10]);
    // Only the answers went away, both questions are intact
    assert_eq!(data.questions.len(), 2);
}

#[tokio::test]
async fn unused_question_cleanup_deletes_type_options() {
    let mut data = MockData::new();
    data.add_question(1, "Q1", "multichoice", "x");
    data.add_question(2, "Q2", "multichoice", "y");
    data.add_quiz_reference(2);
    data.add_qtype_option("multichoice", 1);
    data.add_qtype_option("multichoice", 2);

    let factory = MockRepositoryFactory::new(data);
    let cleaner = cleaner(&factory);

    let report = cleaner
        .run_single_batch(CleanupType::UnusedQuestions, 100)
        .await
        .unwrap();
    assert_eq!(report.deleted, 1);

    let data = factory.snapshot();
    assert_eq!(data.qtype_options["qtype_multichoice_options"], vec![2]);
    assert_eq!(data.questions.len(), 1);
}

#[tokio::test]
async fn batch_size_and_count_are_clamped() {
    let factory = MockRepositoryFactory::new(mixed_bank());
    let cleaner = cleaner(&factory);

    let start = cleaner
        .start_session("alice", CleanupType::UnusedQuestions, Some(0), None)
        .await
        .unwrap();
    assert_eq!(start.batch_size, 1);
    assert_eq!(start.total_batches, 3);

    let capped = cleaner
        .start_session("alice", CleanupType::UnusedQuestions, Some(1), Some(2))
        .await
        .unwrap();
    assert_eq!(capped.total_batches, 2);
}

#[tokio::test]
async fn statistics_are_cached_until_stale() {
    let factory = MockRepositoryFactory::new(mixed_bank());
    let (cleaner, clock) = cleaner_with_clock(&factory);

    let first = cleaner.statistics(false).await.unwrap();
    assert_eq!(first.statistics.total_questions, 5);
    assert_eq!(first.statistics.unused_questions, 3);

    // New data does not show up while the snapshot is fresh
    factory.mutate(|data| data.add_question(6, "Q6", "truefalse", "body 6"));
    let cached = cleaner.statistics(false).await.unwrap();
    assert_eq!(cached, first);

    // Forcing bypasses the cache
    let forced = cleaner.statistics(true).await.unwrap();
    assert_eq!(forced.statistics.total_questions, 6);

    // And so does an expired snapshot
    factory.mutate(|data| data.add_question(7, "Q7", "truefalse", "body 7"));
    clock.advance(chrono::Duration::hours(2));
    let refreshed = cleaner.statistics(false).await.unwrap();
    assert_eq!(refreshed.statistics.total_questions, 7);
}

#[tokio::test]
async fn deletion_invalidates_the_statistics_cache() {
    let factory = MockRepositoryFactory::new(mixed_bank());
    let cleaner = cleaner(&factory);

    let before = cleaner.statistics(false).await.unwrap();
    assert_eq!(before.statistics.unused_questions, 3);

    cleaner
        .run_single_batch(CleanupType::UnusedQuestions, 100)
        .await
        .unwrap();

    let after = cleaner.statistics(false).await.unwrap();
    assert_eq!(after.statistics.total_questions, 2);
    assert_eq!(after.statistics.unused_questions, 0);
}

#[tokio::test]
async fn detailed_statistics_report_table_sizes() {
    let factory = MockRepositoryFactory::new(mixed_bank());
    let cleaner = cleaner(&factory);

    let stats = cleaner.detailed_statistics().await.unwrap();
    let questions = stats.iter().find(|s| s.table == "question").unwrap();
    assert_eq!(questions.rows, 5);
    let answers = stats.iter().find(|s| s.table == "question_answers").unwrap();
    assert_eq!(answers.rows, 5);
}

#[tokio::test]
async fn empty_bank_yields_a_done_session() {
    let factory = MockRepositoryFactory::new(MockData::new());
    let cleaner = cleaner(&factory);

    let start = cleaner
        .start_session("alice", CleanupType::UnusedQuestions, None, None)
        .await
        .unwrap();
    assert_eq!(start.total, 0);
    assert_eq!(start.total_batches, 0);

    let report = cleaner
        .process_batch("alice", CleanupType::UnusedQuestions, None, 1)
        .await
        .unwrap();
    assert_eq!(report.deleted, 0);
    assert!(report.done);
}
