// Telegate Agent - Integration tests
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! End-to-end tests: adapter updates in, streams documents out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;
use telegate::{
    Category, ComponentDescriptor, DataItemDescriptor, FaultLevel, FaultReport, FaultStateOp,
    ObservationInput, StaticCatalog, ValueSet,
};
use telegate_agent::{Agent, AgentConfig, AgentError, AgentHooks, FilterReason, IngestOutcome};
use telegate_testdata::{
    demo_catalog, generate_dataset, AdapterUpdate, GeneratorConfig, MachiningScenario,
};

fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_component(ComponentDescriptor::new("ctrl", "mill", "Controller").with_name("cnc"))
        .with_component(ComponentDescriptor::new("x", "mill", "Linear").with_name("X"))
        .with_data_item(DataItemDescriptor::event("exec", "mill", "ctrl"))
        .with_data_item(DataItemDescriptor::sample("xpos", "mill", "x"))
        .with_data_item(DataItemDescriptor::condition("system", "mill", "ctrl"))
        .with_data_item(DataItemDescriptor::condition("coolant_cond", "mill", "coolant"))
        .with_data_item(DataItemDescriptor::event("lexec", "lathe", "lctrl"))
}

fn agent(buffer_size: usize) -> Agent {
    Agent::new(AgentConfig::with_buffer_size(buffer_size), Arc::new(catalog())).unwrap()
}

fn result_of(document: &telegate_agent::StreamsDocument, item: &str) -> Vec<String> {
    document
        .streams
        .iter()
        .flat_map(|d| d.observations())
        .filter(|o| o.data_item_key() == item)
        .filter_map(|o| o.values().and_then(|v| v.result_value()).map(str::to_string))
        .collect()
}

/// Replay a generated stream through an agent
fn replay(agent: &Agent, updates: &[AdapterUpdate]) -> Vec<IngestOutcome> {
    updates
        .iter()
        .map(|update| match update {
            AdapterUpdate::Condition {
                device_key,
                data_item_key,
                timestamp,
                op,
            } => agent
                .add_condition(device_key, data_item_key, op.clone(), *timestamp)
                .unwrap(),
            AdapterUpdate::Observation { .. } => {
                let input = update.to_input().unwrap();
                agent.add_input(input).unwrap()
            }
        })
        .collect()
}

// ============================================================================
// Buffer window
// ============================================================================

#[test]
fn test_capacity_three_keeps_latest_window() {
    let agent = agent(3);
    for (i, value) in ["V1", "V2", "V3", "V4"].iter().enumerate() {
        let outcome = agent
            .add_observation("mill", "exec", ValueSet::result(*value), i as i64)
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Buffered(i as u64 + 1));
    }

    let current = agent.get_current(None).unwrap();
    assert_eq!(result_of(&current, "exec"), vec!["V4"]);

    let sample = agent.get_sample(None, 1, 10).unwrap();
    let sequences: Vec<u64> = sample
        .streams
        .iter()
        .flat_map(|d| d.observations())
        .map(|o| o.sequence())
        .collect();
    assert_eq!(sequences, vec![2, 3, 4]);
    assert_eq!(result_of(&sample, "exec"), vec!["V2", "V3", "V4"]);

    assert_eq!(sample.header.first_sequence, 2);
    assert_eq!(sample.header.last_sequence, 4);
    assert_eq!(sample.header.next_sequence, 5);
    assert_eq!(sample.header.buffer_size, 3);
}

#[test]
fn test_window_size_after_overflow() {
    let agent = agent(8);
    for i in 0..50 {
        agent
            .add_observation("mill", "xpos", ValueSet::result(i.to_string()), i)
            .unwrap();
    }

    let header = agent.header();
    assert_eq!(header.last_sequence - header.first_sequence + 1, 8);

    let sample = agent.get_sample(None, 1, 50).unwrap();
    assert_eq!(sample.observation_count(), 8);
    assert_eq!(sample.end_sequence, 51);
}

#[test]
fn test_empty_agent_header() {
    let agent = agent(16);
    let header = agent.header();
    assert_eq!(header.first_sequence, 1);
    assert_eq!(header.last_sequence, 0);
    assert_eq!(header.next_sequence, 1);

    let sample = agent.get_sample(None, 1, 10).unwrap();
    assert!(sample.streams.is_empty());
    assert_eq!(sample.end_sequence, 1);
}

#[test]
fn test_sample_polling_resumes_at_end_sequence() {
    let agent = agent(64);
    for i in 0..10 {
        agent
            .add_observation("mill", "xpos", ValueSet::result(i.to_string()), i)
            .unwrap();
    }

    let mut from = 1;
    let mut seen = Vec::new();
    loop {
        let page = agent.get_sample(None, from, 3).unwrap();
        if page.observation_count() == 0 {
            break;
        }
        seen.extend(result_of(&page, "xpos"));
        from = page.end_sequence;
    }

    let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_evicted_range_returns_oldest_retained() {
    let agent = agent(4);
    for i in 0..10 {
        agent
            .add_observation("mill", "xpos", ValueSet::result(i.to_string()), i)
            .unwrap();
    }

    let sample = agent.get_sample(None, 2, 2).unwrap();
    assert_eq!(result_of(&sample, "xpos"), vec!["6", "7"]);
}

#[test]
fn test_current_at_window() {
    let agent = agent(4);
    for (i, value) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
        agent
            .add_observation("mill", "exec", ValueSet::result(*value), i as i64)
            .unwrap();
    }

    let at = agent.get_current_at(None, 4).unwrap();
    assert_eq!(result_of(&at, "exec"), vec!["D"]);
    assert_eq!(at.end_sequence, 5);

    let evicted = agent.get_current_at(None, 2);
    assert!(matches!(evicted, Err(AgentError::Core(_))));
    let future = agent.get_current_at(None, 7);
    assert!(matches!(future, Err(AgentError::Core(_))));
}

// ============================================================================
// Change filtering
// ============================================================================

#[test]
fn test_dedup_idempotence() {
    let agent = agent(16);
    let values = ValueSet::new().with("feed", "100").with("part_count", "7");

    let first = agent
        .add_observation("mill", "exec", values.clone(), 1_000)
        .unwrap();
    let second = agent.add_observation("mill", "exec", values, 2_000).unwrap();

    assert_eq!(first, IngestOutcome::Buffered(1));
    assert_eq!(second, IngestOutcome::Unchanged);
    assert_eq!(agent.get_current(Some("mill")).unwrap().observation_count(), 1);

    let a = ObservationInput::value("mill", "exec", 1_000, "ACTIVE");
    let b = ObservationInput::value("mill", "exec", 2_000, "ACTIVE");
    assert_eq!(a.change_ids().content, b.change_ids().content);
}

#[test]
fn test_separators_inside_values_are_distinct_content() {
    let agent = agent(16);

    let packed = agent
        .add_observation("mill", "exec", ValueSet::new().with("a", "1;b=2"), 1)
        .unwrap();
    let split = agent
        .add_observation("mill", "exec", ValueSet::new().with("a", "1").with("b", "2"), 2)
        .unwrap();

    assert_eq!(packed, IngestOutcome::Buffered(1));
    assert_eq!(split, IngestOutcome::Buffered(2));
}

#[test]
fn test_filter_hook_reports_reason() {
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let hooks = {
        let reasons = Arc::clone(&reasons);
        AgentHooks::new().on_filtered(move |record, reason| {
            reasons.lock().push((record.data_item_key().to_string(), reason));
        })
    };
    let agent = agent(16).with_hooks(hooks);

    agent
        .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 1)
        .unwrap();
    agent
        .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 1)
        .unwrap();
    agent
        .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 2)
        .unwrap();

    assert_eq!(
        *reasons.lock(),
        vec![
            ("exec".to_string(), FilterReason::Resent),
            ("exec".to_string(), FilterReason::Unchanged),
        ]
    );
}

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_coolant_warning_then_normal() {
    let agent = agent(16);
    agent
        .add_condition(
            "mill",
            "coolant_cond",
            FaultStateOp::add_warning(FaultReport::coded("113").with_message("Coolant Low")),
            1,
        )
        .unwrap();
    agent
        .add_condition(
            "mill",
            "coolant_cond",
            FaultStateOp::add_normal(FaultReport::coded("113")),
            2,
        )
        .unwrap();

    let snapshot = agent.condition("mill", "coolant_cond").unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.entries()[0].level(), FaultLevel::Normal);
    assert_eq!(snapshot.entries()[0].native_code(), Some("113"));
    assert!(!snapshot.entries().iter().any(|e| e.level().is_active()));

    let current = agent.get_current(None).unwrap();
    let states: Vec<_> = current
        .streams
        .iter()
        .flat_map(|d| d.observations())
        .filter_map(|o| o.fault_states())
        .collect();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].worst_level(), Some(FaultLevel::Normal));
}

#[test]
fn test_set_fault_collapses_coded_faults() {
    let agent = agent(16);
    for (i, code) in ["X1", "X2"].iter().enumerate() {
        agent
            .add_condition(
                "mill",
                "system",
                FaultStateOp::add_fault(FaultReport::coded(*code)),
                i as i64,
            )
            .unwrap();
    }
    assert_eq!(agent.condition("mill", "system").unwrap().len(), 2);

    agent
        .add_condition(
            "mill",
            "system",
            FaultStateOp::set_fault(FaultReport::message("Axis Overtravel")),
            10,
        )
        .unwrap();

    let snapshot = agent.condition("mill", "system").unwrap();
    assert_eq!(snapshot.len(), 1);
    let entry = &snapshot.entries()[0];
    assert_eq!(entry.level(), FaultLevel::Fault);
    assert_eq!(entry.native_code(), None);
    assert_eq!(entry.message(), Some("Axis Overtravel"));
}

#[test]
fn test_faults_then_set_normal_in_either_order() {
    for codes in [["A", "B"], ["B", "A"]] {
        let agent = agent(16);
        for code in codes {
            agent
                .add_condition(
                    "mill",
                    "system",
                    FaultStateOp::add_fault(FaultReport::coded(code)),
                    1,
                )
                .unwrap();
        }
        agent
            .add_condition("mill", "system", FaultStateOp::set_normal(), 2)
            .unwrap();

        let snapshot = agent.condition("mill", "system").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entries()[0].level(), FaultLevel::Normal);
    }
}

#[test]
fn test_add_fault_replaces_by_code() {
    let agent = agent(16);
    agent
        .add_condition(
            "mill",
            "system",
            FaultStateOp::add_fault(FaultReport::coded("404")),
            1,
        )
        .unwrap();
    let outcome = agent
        .add_condition(
            "mill",
            "system",
            FaultStateOp::add_fault(FaultReport::coded("404").with_message("X")),
            2,
        )
        .unwrap();
    assert!(outcome.is_buffered());

    let snapshot = agent.condition("mill", "system").unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.entries()[0].native_code(), Some("404"));
    assert_eq!(snapshot.entries()[0].message(), Some("X"));
}

#[test]
fn test_repeated_condition_is_unchanged() {
    let agent = agent(16);
    let op = FaultStateOp::add_warning(FaultReport::coded("113"));
    let first = agent.add_condition("mill", "system", op.clone(), 1).unwrap();
    let second = agent.add_condition("mill", "system", op, 2).unwrap();

    assert!(first.is_buffered());
    assert_eq!(second, IngestOutcome::Unchanged);
    assert_eq!(agent.header().last_sequence, 1);
}

#[test]
fn test_clear_by_code() {
    let agent = agent(16);
    for code in ["1", "2"] {
        agent
            .add_condition(
                "mill",
                "system",
                FaultStateOp::add_warning(FaultReport::coded(code)),
                1,
            )
            .unwrap();
    }
    agent
        .add_condition("mill", "system", FaultStateOp::clear("1"), 2)
        .unwrap();

    let snapshot = agent.condition("mill", "system").unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.entries()[0].native_code(), Some("2"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_rejections_reach_hook_and_metrics() {
    let rejected = Arc::new(AtomicUsize::new(0));
    let hooks = {
        let rejected = Arc::clone(&rejected);
        AgentHooks::new().on_rejected(move |_, _, _| {
            rejected.fetch_add(1, Ordering::SeqCst);
        })
    };
    let agent = agent(16).with_hooks(hooks);

    assert!(agent
        .add_observation("mill", "nope", ValueSet::result("1"), 1)
        .is_err());
    assert!(agent
        .add_observation("lathe", "exec", ValueSet::result("1"), 1)
        .is_err());
    assert!(agent
        .add_observation("mill", "system", ValueSet::result("1"), 1)
        .is_err());
    assert!(agent
        .add_condition("mill", "exec", FaultStateOp::set_normal(), 1)
        .is_err());

    assert_eq!(rejected.load(Ordering::SeqCst), 4);
    assert_eq!(agent.metrics().snapshot().rejected, 4);
    assert_eq!(agent.header().next_sequence, 1);
}

#[test]
fn test_unknown_device_filter() {
    let agent = agent(16);
    assert!(matches!(
        agent.get_current(Some("press")),
        Err(AgentError::UnknownDevice(_))
    ));
    assert!(matches!(
        agent.get_sample(Some("press"), 1, 10),
        Err(AgentError::UnknownDevice(_))
    ));
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn test_device_filter_and_grouping() {
    let agent = agent(16);
    agent
        .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 1)
        .unwrap();
    agent
        .add_observation("lathe", "lexec", ValueSet::result("READY"), 2)
        .unwrap();
    agent
        .add_observation("mill", "xpos", ValueSet::result("1.5"), 3)
        .unwrap();

    let all = agent.get_current(None).unwrap();
    assert_eq!(all.streams.len(), 2);
    assert_eq!(all.streams[0].device_key(), "mill");

    let mill = agent.get_current(Some("mill")).unwrap();
    assert_eq!(mill.streams.len(), 1);
    let device = mill.device("mill").unwrap();
    assert_eq!(device.components().len(), 2);

    let ctrl = device.component("ctrl").unwrap();
    assert_eq!(ctrl.name(), Some("cnc"));
    assert_eq!(ctrl.events().count(), 1);
    assert_eq!(device.component("x").unwrap().samples().count(), 1);

    let filtered = agent.get_sample(Some("lathe"), 1, 10).unwrap();
    assert_eq!(filtered.observation_count(), 1);
    assert_eq!(filtered.end_sequence, 4);
}

#[test]
fn test_document_json() {
    let agent = agent(16);
    agent
        .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 1_706_745_600_000)
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&agent.get_current(None).unwrap().to_json().unwrap()).unwrap();
    assert_eq!(json["header"]["nextSequence"], 2);
    assert_eq!(json["header"]["bufferSize"], 16);
    assert_eq!(json["header"]["sender"], "telegate");
    assert_eq!(json["endSequence"], 2);
    assert_eq!(json["streams"][0]["deviceKey"], "mill");
}

#[test]
fn test_device_unavailable_marks_every_item() {
    let agent = agent(32);
    agent
        .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 1)
        .unwrap();
    agent
        .add_condition("mill", "system", FaultStateOp::set_normal(), 1)
        .unwrap();

    let buffered = agent.set_device_unavailable("mill", 2).unwrap();
    assert_eq!(buffered, 4);

    let current = agent.get_current(Some("mill")).unwrap();
    for observation in current.streams.iter().flat_map(|d| d.observations()) {
        assert!(observation.is_unavailable(), "{}", observation.data_item_key());
    }
    assert_eq!(
        agent.condition("mill", "coolant_cond").unwrap().worst_level(),
        Some(FaultLevel::Unavailable)
    );
}

// ============================================================================
// Generated adapter streams
// ============================================================================

fn demo_agent(buffer_size: usize) -> Agent {
    Agent::new(
        AgentConfig::with_buffer_size(buffer_size),
        Arc::new(demo_catalog(telegate_testdata::DEVICE)),
    )
    .unwrap()
}

#[test]
fn test_replay_every_scenario() {
    let config = GeneratorConfig::new().with_num_samples(200).with_seed(42);
    for scenario in MachiningScenario::all() {
        let dataset = generate_dataset(&config, scenario);
        let agent = demo_agent(1 << 12);
        let outcomes = replay(&agent, dataset.updates());

        let buffered = outcomes.iter().filter(|o| o.is_buffered()).count() as u64;
        let metrics = agent.metrics().snapshot();
        assert_eq!(metrics.buffered, buffered, "{}", scenario.name());
        assert_eq!(metrics.rejected, 0);
        assert_eq!(agent.header().last_sequence, buffered);

        let current = agent.get_current(None).unwrap();
        assert!(current.observation_count() <= 12);
    }
}

#[test]
fn test_replay_axis_overtravel_ends_normal() {
    let config = GeneratorConfig::new().with_num_samples(200).with_seed(1);
    let dataset = generate_dataset(&config, MachiningScenario::AxisOvertravel);
    let agent = demo_agent(1 << 12);
    replay(&agent, dataset.updates());

    let snapshot = agent.condition("mill", "xtravel").unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.entries()[0].level(), FaultLevel::Normal);

    let faults = agent
        .get_sample(None, 1, 1000)
        .unwrap()
        .streams
        .iter()
        .flat_map(|d| d.observations())
        .filter_map(|o| o.fault_states())
        .filter(|s| s.worst_level() == Some(FaultLevel::Fault))
        .map(|s| s.len())
        .collect::<Vec<_>>();
    assert!(faults.contains(&2));
    assert!(faults.contains(&1));
}

#[test]
fn test_replay_disconnect_goes_unavailable() {
    let config = GeneratorConfig::new().with_num_samples(100).with_seed(3);
    let dataset = generate_dataset(&config, MachiningScenario::AdapterDisconnect);
    let cut = config.start_time_ms + 50 * config.sample_interval_ms;

    let agent = demo_agent(1 << 12);
    let before: Vec<_> = dataset
        .updates()
        .iter()
        .filter(|u| u.timestamp() <= cut)
        .cloned()
        .collect();
    replay(&agent, &before);

    let snapshot = agent.condition("mill", "system").unwrap();
    assert_eq!(snapshot.worst_level(), Some(FaultLevel::Unavailable));

    let current = agent.get_current(None).unwrap();
    let exec: Vec<_> = current
        .streams
        .iter()
        .flat_map(|d| d.observations())
        .filter(|o| o.data_item_key() == "exec")
        .collect();
    assert!(exec[0].is_unavailable());
}

#[test]
fn test_replay_small_buffer_evicts() {
    let evicted = Arc::new(AtomicUsize::new(0));
    let hooks = {
        let evicted = Arc::clone(&evicted);
        AgentHooks::new().on_evicted(move |_| {
            evicted.fetch_add(1, Ordering::SeqCst);
        })
    };

    let config = GeneratorConfig::new().with_num_samples(120).with_seed(9);
    let dataset = generate_dataset(&config, MachiningScenario::NormalCycle);
    let agent = demo_agent(64).with_hooks(hooks);
    replay(&agent, dataset.updates());

    let header = agent.header();
    assert_eq!(header.last_sequence - header.first_sequence + 1, 64);
    assert_eq!(evicted.load(Ordering::SeqCst) as u64, header.first_sequence - 1);

    // evicted points still report their latest value
    let current = agent.get_current(None).unwrap();
    let categories: Vec<Category> = current
        .streams
        .iter()
        .flat_map(|d| d.observations())
        .map(|o| o.category())
        .collect();
    assert!(categories.contains(&Category::Condition));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_producers_get_gapless_sequences() {
    let mut catalog = StaticCatalog::new();
    for t in 0..8 {
        catalog.add_data_item(DataItemDescriptor::sample(format!("s{}", t), "mill", "x"));
    }
    let agent = Arc::new(
        Agent::new(AgentConfig::with_buffer_size(1 << 12), Arc::new(catalog)).unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let agent = Arc::clone(&agent);
            thread::spawn(move || {
                let item = format!("s{}", t);
                (0..200)
                    .map(|i| {
                        agent
                            .add_observation("mill", &item, ValueSet::result(i.to_string()), i)
                            .unwrap()
                            .sequence()
                            .unwrap()
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut sequences: Vec<u64> = Vec::new();
    for handle in handles {
        let own = handle.join().unwrap();
        assert!(own.windows(2).all(|w| w[0] < w[1]));
        sequences.extend(own);
    }
    sequences.sort_unstable();
    let expected: Vec<u64> = (1..=1600).collect();
    assert_eq!(sequences, expected);

    let current = agent.get_current(None).unwrap();
    assert_eq!(current.observation_count(), 8);
    for observation in current.streams.iter().flat_map(|d| d.observations()) {
        assert_eq!(observation.values().unwrap().result_value(), Some("199"));
    }
}

#[test]
fn test_readers_see_consistent_headers() {
    let agent = Arc::new(agent(32));
    let writer = {
        let agent = Arc::clone(&agent);
        thread::spawn(move || {
            for i in 0..2_000 {
                agent
                    .add_observation("mill", "xpos", ValueSet::result(i.to_string()), i)
                    .unwrap();
            }
        })
    };

    let reader = {
        let agent = Arc::clone(&agent);
        thread::spawn(move || {
            for _ in 0..500 {
                let page = agent.get_sample(None, 0, 32).unwrap();
                let sequences: Vec<u64> = page
                    .streams
                    .iter()
                    .flat_map(|d| d.observations())
                    .map(|o| o.sequence())
                    .collect();
                if let Some(first) = sequences.first() {
                    assert_eq!(*first, page.header.first_sequence);
                    assert_eq!(*sequences.last().unwrap(), page.header.last_sequence);
                }
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(agent.header().next_sequence, 2_001);
}

#[test]
fn test_concurrent_condition_writers_match_current() {
    let slow_hooks = AgentHooks::new().on_buffered(|_| thread::yield_now());
    let agent = Arc::new(agent(1 << 10).with_hooks(slow_hooks));

    let handles: Vec<_> = (0..6)
        .map(|t| {
            let agent = Arc::clone(&agent);
            thread::spawn(move || {
                for i in 0..20 {
                    let report = FaultReport::coded(format!("E{}-{}", t, i));
                    agent
                        .add_condition("mill", "system", FaultStateOp::add_fault(report), i)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let held = agent.condition("mill", "system").unwrap();
    assert_eq!(held.len(), 120);

    let current = agent.get_current(Some("mill")).unwrap();
    let reported = current
        .streams
        .iter()
        .flat_map(|d| d.observations())
        .filter(|o| o.data_item_key() == "system")
        .filter_map(|o| o.fault_states())
        .next()
        .unwrap();
    assert_eq!(reported.len(), 120);
    assert_eq!(reported.change_id(), held.change_id());
}

#[test]
fn test_hooks_may_read_the_agent() {
    let slot: Arc<Mutex<Option<Weak<Agent>>>> = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hooks = {
        let slot = Arc::clone(&slot);
        let seen = Arc::clone(&seen);
        AgentHooks::new().on_buffered(move |observation| {
            let agent = slot.lock().as_ref().and_then(Weak::upgrade);
            if let Some(agent) = agent {
                let header = agent.header();
                let current = agent.get_current(None).unwrap();
                seen.lock().push((
                    observation.sequence(),
                    header.last_sequence,
                    current.observation_count(),
                ));
            }
        })
    };
    let agent = Arc::new(agent(16).with_hooks(hooks));
    *slot.lock() = Some(Arc::downgrade(&agent));

    agent
        .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 1)
        .unwrap();
    agent
        .add_condition(
            "mill",
            "system",
            FaultStateOp::add_warning(FaultReport::coded("113")),
            2,
        )
        .unwrap();

    assert_eq!(*seen.lock(), vec![(1, 1, 1), (2, 2, 2)]);
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn buffered_sequences_are_gapless(
            capacity in 1usize..16,
            values in prop::collection::vec(0u8..4, 1..64),
        ) {
            let agent = agent(capacity);
            let mut last = 0;
            for (i, value) in values.iter().enumerate() {
                let outcome = agent
                    .add_observation("mill", "xpos", ValueSet::result(value.to_string()), i as i64)
                    .unwrap();
                if let Some(sequence) = outcome.sequence() {
                    prop_assert_eq!(sequence, last + 1);
                    last = sequence;
                }
            }

            let header = agent.header();
            prop_assert_eq!(header.last_sequence, last);
            prop_assert_eq!(header.next_sequence, last + 1);
            let held = (header.last_sequence + 1 - header.first_sequence) as usize;
            prop_assert_eq!(held, (last as usize).min(capacity));

            let current = agent.get_current(None).unwrap();
            prop_assert_eq!(current.observation_count(), 1);
            let latest = values.last().unwrap().to_string();
            prop_assert_eq!(result_of(&current, "xpos"), vec![latest]);
        }
    }
}
