//! Unit tests for destruction_queue.rs

use super::*;
use std::sync::{Arc, Mutex};

// ============================================================================
// Basic push/flush tests
// ============================================================================

#[test]
fn test_new_is_empty() {
    let queue = DestructionQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_push_does_not_execute() {
    let counter = Arc::new(Mutex::new(0));
    let mut queue = DestructionQueue::new();

    let c = Arc::clone(&counter);
    queue.push(move || *c.lock().unwrap() += 1);

    // No side effects until flush
    assert_eq!(*counter.lock().unwrap(), 0);
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_flush_executes_and_clears() {
    let counter = Arc::new(Mutex::new(0));
    let mut queue = DestructionQueue::new();

    for _ in 0..3 {
        let c = Arc::clone(&counter);
        queue.push(move || *c.lock().unwrap() += 1);
    }

    queue.flush();
    assert_eq!(*counter.lock().unwrap(), 3);
    assert!(queue.is_empty());
}

// ============================================================================
// Ordering tests
// ============================================================================

#[test]
fn test_flush_runs_in_reverse_insertion_order() {
    // For N pushes, flush must invoke callbacks in order N, N-1, ..., 1
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut queue = DestructionQueue::new();

    for i in 1..=5 {
        let o = Arc::clone(&order);
        queue.push(move || o.lock().unwrap().push(i));
    }

    queue.flush();
    assert_eq!(*order.lock().unwrap(), vec![5, 4, 3, 2, 1]);
}

#[test]
fn test_dependent_resources_destroyed_first() {
    // Simulates the real usage pattern: a "buffer" registered after its
    // "allocation" must be destroyed before it.
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut queue = DestructionQueue::new();

    let o = Arc::clone(&order);
    queue.push(move || o.lock().unwrap().push("allocation"));
    let o = Arc::clone(&order);
    queue.push(move || o.lock().unwrap().push("buffer"));

    queue.flush();
    assert_eq!(*order.lock().unwrap(), vec!["buffer", "allocation"]);
}

// ============================================================================
// Reuse after flush
// ============================================================================

#[test]
fn test_push_after_flush_starts_fresh_batch() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut queue = DestructionQueue::new();

    let o = Arc::clone(&order);
    queue.push(move || o.lock().unwrap().push(1));
    queue.flush();

    let o = Arc::clone(&order);
    queue.push(move || o.lock().unwrap().push(2));
    let o = Arc::clone(&order);
    queue.push(move || o.lock().unwrap().push(3));
    queue.flush();

    // Second batch flushed independently, still LIFO
    assert_eq!(*order.lock().unwrap(), vec![1, 3, 2]);
}

#[test]
fn test_flush_empty_queue_is_noop() {
    let mut queue = DestructionQueue::new();
    queue.flush();
    assert!(queue.is_empty());
}
