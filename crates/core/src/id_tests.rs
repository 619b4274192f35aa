// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn uuid_gen_creates_unique_ids() {
    let id_gen = UuidIdGen;
    let id1 = id_gen.next();
    let id2 = id_gen.next();
    assert_ne!(id1, id2);
    assert_eq!(id1.len(), 36);
}

#[test]
fn sequential_gen_shares_its_counter_between_clones() {
    let id_gen1 = SequentialIdGen::new("abort");
    let id_gen2 = id_gen1.clone();
    assert_eq!(id_gen1.next(), "abort-1");
    assert_eq!(id_gen2.next(), "abort-2");
    assert_eq!(SequentialIdGen::default().next(), "delayed-1");
}
