// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::tests::REDIS_URL_VAR;
use cm_core::adapters::FakeHeadChannel;
use cm_core::{FakeClock, FeedbackKind, FeedbackStatus, SequentialIdGen};
use yare::parameterized;

async fn manager(channel: &FakeHeadChannel, clock: &FakeClock) -> Option<RedisDelayedFeedbackManager> {
    let url = std::env::var(REDIS_URL_VAR).ok()?;
    let connection = crate::connect(&url).await.unwrap();
    Some(RedisDelayedFeedbackManager::new(
        connection,
        Arc::new(channel.clone()),
        Arc::new(SequentialIdGen::new(format!("delayed-{}-", std::process::id()))),
        Arc::new(clock.clone()),
    ))
}

fn timeout(campaign_key: &str) -> Feedback {
    Feedback::new(
        format!("tenant-{}", std::process::id()),
        campaign_key,
        "",
        FeedbackStatus::Completed,
        FeedbackKind::CampaignTimeout { hard: true },
    )
}

fn published_for(channel: &FakeHeadChannel, campaign_key: &str) -> Vec<(String, Feedback)> {
    channel
        .feedbacks()
        .into_iter()
        .filter(|(_, feedback)| feedback.campaign_key == campaign_key)
        .collect()
}

#[parameterized(
    immediate = { 1_000, Duration::ZERO, 1_000 },
    short = { 1_000, Duration::from_millis(250), 1_250 },
    huge_delay_is_clamped = { 1_000, Duration::MAX, i64::MAX },
    late_clock_is_clamped = { i64::MAX - 10, Duration::from_secs(1), i64::MAX },
)]
fn due_score(now: i64, delay: Duration, expected: i64) {
    assert_eq!(due_millis(now, delay), expected);
}

#[tokio::test]
async fn feedback_is_published_once_due() {
    let channel = FakeHeadChannel::new();
    let clock = FakeClock::new();
    let Some(manager) = manager(&channel, &clock).await else { return };

    manager
        .schedule("feedbacks", timeout("due-once"), Duration::from_secs(10))
        .await
        .unwrap();

    manager.poll_due().await.unwrap();
    assert!(published_for(&channel, "due-once").is_empty());

    clock.advance(Duration::from_secs(10));
    manager.poll_due().await.unwrap();
    let published = published_for(&channel, "due-once");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "feedbacks");
    assert_eq!(published[0].1, timeout("due-once"));

    // Claimed entries are gone
    manager.poll_due().await.unwrap();
    assert_eq!(published_for(&channel, "due-once").len(), 1);
}

#[tokio::test]
async fn due_feedback_is_claimed_by_a_single_head() {
    let first_channel = FakeHeadChannel::new();
    let second_channel = FakeHeadChannel::new();
    let clock = FakeClock::new();
    let Some(first) = manager(&first_channel, &clock).await else { return };
    let Some(second) = manager(&second_channel, &clock).await else { return };

    first
        .schedule("feedbacks", timeout("claimed-once"), Duration::from_millis(1))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(1));

    let _ = tokio::join!(first.poll_due(), second.poll_due());

    let total = published_for(&first_channel, "claimed-once").len()
        + published_for(&second_channel, "claimed-once").len();
    assert_eq!(total, 1);
}
