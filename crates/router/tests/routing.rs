// This code is part of Qumap.
//
// (C) Copyright Qumap contributors 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use qumap_circuit::{Gate, Netlist, PhysicalQubit, WireId, WireRef};
use qumap_router::{route, JitRouter, MappedDag, RouteError, RouterConfig, RoutingTarget};

fn p(i: u32) -> PhysicalQubit {
    PhysicalQubit::new(i)
}

fn q(i: u32) -> WireId {
    WireId::new(i)
}

fn placed(indices: &[u32]) -> Vec<Option<PhysicalQubit>> {
    indices.iter().map(|&i| Some(p(i))).collect()
}

/// Emitted operations as `(gate, physical indices)` tuples.
fn ops(dag: &MappedDag) -> Vec<(Gate, Vec<u32>)> {
    dag.ops()
        .iter()
        .map(|op| {
            (
                op.gate,
                op.qubits.iter().map(|q| q.qubit.index() as u32).collect(),
            )
        })
        .collect()
}

fn swaps(dag: &MappedDag) -> Vec<[u32; 2]> {
    dag.ops()
        .iter()
        .filter(|op| op.gate == Gate::Swap)
        .map(|op| {
            [
                op.qubits[0].qubit.index() as u32,
                op.qubits[1].qubit.index() as u32,
            ]
        })
        .collect()
}

fn assert_adjacent(target: &RoutingTarget, dag: &MappedDag) {
    for op in dag.ops() {
        if let [a, b] = op.qubits[..] {
            assert!(
                target.are_connected(a.qubit, b.qubit),
                "{} emitted on non-adjacent physicals {} and {}",
                op.gate,
                a.qubit.index(),
                b.qubit.index(),
            );
        }
    }
}

/// Replay the emitted SWAPs over a fully-placed initial map.
fn apply_swaps(initial: &[Option<PhysicalQubit>], dag: &MappedDag) -> Vec<Option<PhysicalQubit>> {
    let mut v_to_phy = initial.to_vec();
    for op in dag.ops() {
        if op.gate != Gate::Swap {
            continue;
        }
        let (a, b) = (op.qubits[0].qubit, op.qubits[1].qubit);
        for slot in v_to_phy.iter_mut() {
            if *slot == Some(a) {
                *slot = Some(b);
            } else if *slot == Some(b) {
                *slot = Some(a);
            }
        }
    }
    v_to_phy
}

/// For a fully-placed routing, check that the non-SWAP operations touch each
/// wire in exactly the input order (topological compatibility plus gate
/// preservation, wire by wire).
fn check_wire_order(
    input: &[(Gate, Vec<u32>)],
    initial: &[Option<PhysicalQubit>],
    dag: &MappedDag,
) {
    let mut v_to_phy: Vec<PhysicalQubit> = initial.iter().map(|p| p.unwrap()).collect();
    let mut emitted: Vec<Vec<Gate>> = vec![Vec::new(); v_to_phy.len()];
    for op in dag.ops() {
        if op.gate == Gate::Swap {
            let (a, b) = (op.qubits[0].qubit, op.qubits[1].qubit);
            for phy in v_to_phy.iter_mut() {
                if *phy == a {
                    *phy = b;
                } else if *phy == b {
                    *phy = a;
                }
            }
        } else {
            for operand in &op.qubits {
                let v = v_to_phy
                    .iter()
                    .position(|phy| *phy == operand.qubit)
                    .expect("every emitted operand hosts a virtual qubit");
                emitted[v].push(op.gate);
            }
        }
    }
    let mut expected: Vec<Vec<Gate>> = vec![Vec::new(); v_to_phy.len()];
    for (gate, wires) in input {
        for wire in wires {
            expected[*wire as usize].push(*gate);
        }
    }
    assert_eq!(emitted, expected);
}

#[test]
fn line_routes_distant_cx() {
    let target = RoutingTarget::line(3);
    let mut netlist = Netlist::with_wires(3);
    netlist.create_op2(Gate::Cx, q(0), q(2));

    let mapped = route(&target, &netlist, &placed(&[0, 1, 2])).unwrap();
    assert_eq!(
        ops(&mapped),
        vec![(Gate::Swap, vec![0, 1]), (Gate::Cx, vec![1, 2])]
    );
    assert_eq!(mapped.v_to_phy(), placed(&[1, 0, 2]));
    assert_eq!(
        apply_swaps(&placed(&[0, 1, 2]), &mapped),
        mapped.v_to_phy().to_vec()
    );
    assert_adjacent(&target, &mapped);
}

#[test]
fn ring_routes_two_crossing_cx() {
    let target = RoutingTarget::ring(4);
    let mut netlist = Netlist::with_wires(4);
    netlist.create_op2(Gate::Cx, q(0), q(2));
    netlist.create_op2(Gate::Cx, q(1), q(3));

    let mapped = route(&target, &netlist, &placed(&[0, 1, 2, 3])).unwrap();
    assert_eq!(
        ops(&mapped),
        vec![
            (Gate::Swap, vec![0, 1]),
            (Gate::Cx, vec![1, 2]),
            (Gate::Cx, vec![0, 3]),
        ]
    );
    assert_adjacent(&target, &mapped);
}

#[test]
fn jit_place_one_flushes_buffered_gates() {
    let target = RoutingTarget::line(3);
    let mut netlist = Netlist::with_wires(3);
    netlist.create_op(Gate::H, q(1));
    netlist.create_op2(Gate::Cx, q(0), q(1));

    let placement = vec![Some(p(0)), None, Some(p(1))];
    let mapped = route(&target, &netlist, &placement).unwrap();
    // The H waits until cx(q0, q1) forces q1 onto the only free physical,
    // which is qubit 2; a swap then brings the pair together.
    assert_eq!(
        ops(&mapped),
        vec![
            (Gate::H, vec![2]),
            (Gate::Swap, vec![0, 1]),
            (Gate::Cx, vec![1, 2]),
        ]
    );
    assert_eq!(mapped.v_to_phy(), placed(&[1, 2, 0]));
    assert_adjacent(&target, &mapped);
}

#[test]
fn complete_graph_needs_no_swaps() {
    let target = RoutingTarget::complete(3);
    let mut netlist = Netlist::with_wires(3);
    netlist.create_op(Gate::H, q(0));
    netlist.create_op2(Gate::Cx, WireRef::new(q(0)).complement(), q(1));
    netlist.create_op(Gate::X, q(1));

    let mapped = route(&target, &netlist, &placed(&[2, 0, 1])).unwrap();
    assert_eq!(mapped.swap_count(), 0);
    assert_eq!(
        ops(&mapped),
        vec![
            (Gate::H, vec![2]),
            (Gate::Cx, vec![2, 0]),
            (Gate::X, vec![0]),
        ]
    );
    // The negative-control polarity rides along on the emitted control.
    let cx = &mapped.ops()[1];
    assert!(cx.qubits[0].complemented);
    assert!(!cx.qubits[1].complemented);
    assert_eq!(mapped.v_to_phy(), placed(&[2, 0, 1]));
}

#[test]
fn decay_steers_away_from_recent_swaps() {
    let target = RoutingTarget::line(6);
    let mut netlist = Netlist::with_wires(6);
    netlist.create_op2(Gate::Cx, q(0), q(5));
    let initial = placed(&[0, 1, 2, 3, 4, 5]);

    // With decay, the second search is pushed to the far side of the line
    // instead of marching the same qubit the whole way.
    let mapped = route(&target, &netlist, &initial).unwrap();
    assert_eq!(swaps(&mapped), vec![[0, 1], [4, 5], [1, 2], [2, 3]]);
    assert_eq!(ops(&mapped).last().unwrap(), &(Gate::Cx, vec![3, 4]));
    assert_adjacent(&target, &mapped);

    let no_decay = RouterConfig {
        decay_delta: 0.0,
        ..RouterConfig::default()
    };
    let mapped = JitRouter::new(&target, no_decay)
        .route(&netlist, &initial, true)
        .unwrap();
    assert_eq!(swaps(&mapped), vec![[0, 1], [1, 2], [2, 3], [3, 4]]);
    assert_eq!(ops(&mapped).last().unwrap(), &(Gate::Cx, vec![4, 5]));
    assert_adjacent(&target, &mapped);
}

#[test]
fn look_ahead_reduces_swaps() {
    let target = RoutingTarget::line(3);
    let mut netlist = Netlist::with_wires(3);
    netlist.create_op2(Gate::Cx, q(0), q(2));
    netlist.create_op2(Gate::Cx, q(1), q(2));
    let initial = placed(&[0, 1, 2]);

    let with_look_ahead = route(&target, &netlist, &initial).unwrap();
    let without = JitRouter::new(
        &target,
        RouterConfig {
            use_look_ahead: false,
            ..RouterConfig::default()
        },
    )
    .route(&netlist, &initial, true)
    .unwrap();

    assert_eq!(with_look_ahead.swap_count(), 1);
    assert_eq!(without.swap_count(), 2);
    assert_adjacent(&target, &with_look_ahead);
    assert_adjacent(&target, &without);
    for mapped in [&with_look_ahead, &without] {
        let gates: Vec<_> = ops(mapped)
            .into_iter()
            .filter(|(gate, _)| *gate != Gate::Swap)
            .collect();
        assert_eq!(gates.len(), 2);
    }
}

#[test]
fn disabling_the_window_size_disables_look_ahead() {
    let target = RoutingTarget::line(3);
    let mut netlist = Netlist::with_wires(3);
    netlist.create_op2(Gate::Cx, q(0), q(2));
    netlist.create_op2(Gate::Cx, q(1), q(2));
    let initial = placed(&[0, 1, 2]);

    let zero_window = JitRouter::new(
        &target,
        RouterConfig {
            e_set_size: 0,
            ..RouterConfig::default()
        },
    )
    .route(&netlist, &initial, true)
    .unwrap();
    // Same behaviour as use_look_ahead = false.
    assert_eq!(zero_window.swap_count(), 2);
}

#[test]
fn empty_circuit_publishes_placement_unchanged() {
    let target = RoutingTarget::line(3);
    let netlist = Netlist::with_wires(3);
    let initial = vec![Some(p(0)), None, Some(p(2))];

    let unfinalised = JitRouter::new(&target, RouterConfig::default())
        .route(&netlist, &initial, false)
        .unwrap();
    assert_eq!(unfinalised.num_ops(), 0);
    assert_eq!(unfinalised.v_to_phy(), initial);

    let finalised = route(&target, &netlist, &initial).unwrap();
    assert_eq!(finalised.num_ops(), 0);
    assert_eq!(finalised.v_to_phy(), placed(&[0, 1, 2]));
}

#[test]
fn one_qubit_gates_flush_at_finalisation() {
    let target = RoutingTarget::line(3);
    let mut netlist = Netlist::with_wires(3);
    netlist.create_op(Gate::H, q(0));
    netlist.create_op(Gate::X, q(1));
    netlist.create_op(Gate::S, q(2));

    let mapped = route(&target, &netlist, &[Some(p(0)), None, None]).unwrap();
    assert_eq!(mapped.swap_count(), 0);
    // Finalisation pops free physicals from the back of the ascending list.
    assert_eq!(
        ops(&mapped),
        vec![
            (Gate::H, vec![0]),
            (Gate::X, vec![2]),
            (Gate::S, vec![1]),
        ]
    );
    assert_eq!(mapped.v_to_phy(), placed(&[0, 2, 1]));
}

#[test]
fn place_two_picks_closest_free_pair() {
    let target = RoutingTarget::line(5);
    let mut netlist = Netlist::with_wires(5);
    netlist.create_op2(Gate::Cx, q(0), q(1));

    let placement = vec![None, None, Some(p(1)), Some(p(4)), None];
    let mapped = JitRouter::new(&target, RouterConfig::default())
        .route(&netlist, &placement, false)
        .unwrap();
    // Free physicals are 0, 2 and 3; the closest pair is (2, 3).
    assert_eq!(ops(&mapped), vec![(Gate::Cx, vec![2, 3])]);
    assert_eq!(mapped.swap_count(), 0);
}

#[test]
fn place_two_flushes_in_buffer_order() {
    let target = RoutingTarget::line(3);
    let mut netlist = Netlist::with_wires(3);
    netlist.create_op(Gate::H, q(0));
    netlist.create_op(Gate::T, q(0));
    netlist.create_op2(Gate::Cx, q(0), q(1));

    let mapped = route(&target, &netlist, &[None, None, None]).unwrap();
    // With every physical free, the first minimum-distance pair is (0, 1).
    assert_eq!(
        ops(&mapped),
        vec![
            (Gate::H, vec![0]),
            (Gate::T, vec![0]),
            (Gate::Cx, vec![0, 1]),
        ]
    );
    assert_eq!(mapped.v_to_phy(), placed(&[0, 1, 2]));
}

#[test]
fn directives_are_dropped() {
    let target = RoutingTarget::line(2);
    let mut netlist = Netlist::with_wires(2);
    netlist.create_op(Gate::H, q(0));
    netlist.create_op2(Gate::Cx, q(0), q(1));
    netlist.create_op(Gate::Barrier, q(0));

    let mapped = route(&target, &netlist, &placed(&[0, 1])).unwrap();
    assert_eq!(
        ops(&mapped),
        vec![(Gate::H, vec![0]), (Gate::Cx, vec![0, 1])]
    );
}

#[test]
fn routed_output_preserves_wire_order() {
    let target = RoutingTarget::ring(5);
    let mut netlist = Netlist::with_wires(5);
    let input: Vec<(Gate, Vec<u32>)> = vec![
        (Gate::Cx, vec![0, 2]),
        (Gate::Cx, vec![1, 3]),
        (Gate::H, vec![2]),
        (Gate::Cx, vec![2, 4]),
        (Gate::Cz, vec![0, 3]),
        (Gate::X, vec![0]),
    ];
    for (gate, wires) in &input {
        match wires[..] {
            [wire] => {
                netlist.create_op(*gate, q(wire));
            }
            [control, target] => {
                netlist.create_op2(*gate, q(control), q(target));
            }
            _ => unreachable!(),
        }
    }

    let initial = placed(&[0, 1, 2, 3, 4]);
    let mapped = route(&target, &netlist, &initial).unwrap();

    assert_adjacent(&target, &mapped);
    // Gate preservation: every input gate exactly once, plus the swaps.
    let non_swap = mapped.num_ops() - mapped.swap_count();
    assert_eq!(non_swap, input.len());
    // The swaps compose onto the initial placement to give the final map.
    assert_eq!(apply_swaps(&initial, &mapped), mapped.v_to_phy().to_vec());
    // Per-wire gate order survives routing.
    check_wire_order(&input, &initial, &mapped);
}

#[test]
fn routing_is_deterministic() {
    let target = RoutingTarget::grid(2, 3);
    let mut netlist = Netlist::with_wires(6);
    netlist.create_op2(Gate::Cx, q(0), q(5));
    netlist.create_op2(Gate::Cx, q(1), q(4));
    netlist.create_op2(Gate::Cz, q(2), q(3));
    let initial = placed(&[0, 1, 2, 3, 4, 5]);

    let first = route(&target, &netlist, &initial).unwrap();
    let second = route(&target, &netlist, &initial).unwrap();
    assert_eq!(first.ops(), second.ops());
    assert_eq!(first.v_to_phy(), second.v_to_phy());
}

#[test]
fn look_ahead_leaves_counters_untouched() {
    let target = RoutingTarget::line(3);
    let mut netlist = Netlist::with_wires(3);
    let first = netlist.create_op2(Gate::Cx, q(0), q(2));
    let second = netlist.create_op2(Gate::Cx, q(1), q(2));
    let initial = placed(&[0, 1, 2]);

    route(&target, &netlist, &initial).unwrap();
    let with_look_ahead = [netlist.value(first), netlist.value(second)];

    JitRouter::new(
        &target,
        RouterConfig {
            use_look_ahead: false,
            ..RouterConfig::default()
        },
    )
    .route(&netlist, &initial, true)
    .unwrap();
    let without = [netlist.value(first), netlist.value(second)];

    // Every routed node ends at its arity; the speculative walk is undone.
    assert_eq!(with_look_ahead, [2, 2]);
    assert_eq!(with_look_ahead, without);
}

#[test]
fn disconnected_operands_surface_no_progress() {
    let target = RoutingTarget::from_edges(4, &[[0, 1], [2, 3]]).unwrap();
    let mut netlist = Netlist::with_wires(4);
    netlist.create_op2(Gate::Cx, q(0), q(2));

    let result = route(&target, &netlist, &placed(&[0, 1, 2, 3]));
    assert!(matches!(result, Err(RouteError::NoProgress { .. })));
}

#[test]
fn entry_preconditions_are_checked() {
    let target = RoutingTarget::line(3);
    let netlist = Netlist::with_wires(3);
    let router = JitRouter::new(&target, RouterConfig::default());

    assert_eq!(
        router.route(&netlist, &placed(&[0, 1]), true).unwrap_err(),
        RouteError::PlacementLength {
            got: 2,
            expected: 3
        }
    );
    assert_eq!(
        router
            .route(&netlist, &[Some(p(5)), None, None], true)
            .unwrap_err(),
        RouteError::PlacementOutOfBounds(p(5))
    );
    assert_eq!(
        router
            .route(&netlist, &[Some(p(0)), Some(p(0)), None], true)
            .unwrap_err(),
        RouteError::PlacementCollision(p(0))
    );

    let bad_config = RouterConfig {
        num_rounds_decay_reset: 0,
        ..RouterConfig::default()
    };
    assert_eq!(
        JitRouter::new(&target, bad_config)
            .route(&netlist, &placed(&[0, 1, 2]), true)
            .unwrap_err(),
        RouteError::ZeroDecayResetInterval
    );

    let wide = Netlist::with_wires(4);
    assert_eq!(
        router.route(&wide, &placed(&[0, 1, 2]), true).unwrap_err(),
        RouteError::WidthExceedsDevice {
            wires: 4,
            qubits: 3
        }
    );
}
