//! Rank power states: power-down and self-refresh entry/exit.

use crate::common::{ddr3_controller, tick_until, Recorder};
use dramsim_core::request::{ReqKind, Request};
use dramsim_core::spec::State;

fn rank_state(ctrl: &dramsim_core::Controller) -> Option<State> {
    ctrl.channel.children[0].state
}

fn power_request(kind: ReqKind) -> Request {
    Request::with_addr_vec(vec![0, 0, -1, -1, -1], kind)
}

// ══════════════════════════════════════════════════════════
// 1. Power-down with all banks closed is precharge power-down
// ══════════════════════════════════════════════════════════

#[test]
fn idle_rank_enters_precharge_power_down() {
    let mut ctrl = ddr3_controller();
    assert_eq!(rank_state(&ctrl), Some(State::PowerUp));

    assert!(ctrl.enqueue(power_request(ReqKind::PowerDown)));
    ctrl.tick();
    assert_eq!(rank_state(&ctrl), Some(State::PrePowerDown));
}

// ══════════════════════════════════════════════════════════
// 2. Power-down over an open bank is active power-down, and a read
//    exits through PDX before touching the array
// ══════════════════════════════════════════════════════════

#[test]
fn read_exits_power_down_first() {
    let mut ctrl = ddr3_controller();
    let recorder = Recorder::new();

    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 0, 0])));
    tick_until(&mut ctrl, &recorder, 1, 100);

    assert!(ctrl.enqueue(power_request(ReqKind::PowerDown)));
    for _ in 0..10 {
        ctrl.tick();
    }
    // the row stayed open under power-down
    assert_eq!(rank_state(&ctrl), Some(State::ActPowerDown));

    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 0, 1])));
    tick_until(&mut ctrl, &recorder, 2, 200);
    assert_eq!(rank_state(&ctrl), Some(State::PowerUp));
    // still a row hit once awake
    assert_eq!(ctrl.stats.row_hits, 1);
}

// ══════════════════════════════════════════════════════════
// 3. Self-refresh rejects data commands until SRX
// ══════════════════════════════════════════════════════════

#[test]
fn self_refresh_gates_reads_on_srx() {
    let mut ctrl = ddr3_controller();
    let recorder = Recorder::new();
    let n_xs = ctrl.spec.speed.n_xs;

    assert!(ctrl.enqueue(power_request(ReqKind::SelfRefresh)));
    ctrl.tick();
    assert_eq!(rank_state(&ctrl), Some(State::SelfRefresh));

    let entered = ctrl.clk;
    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 0, 0])));
    tick_until(&mut ctrl, &recorder, 1, 1000);
    assert_eq!(rank_state(&ctrl), Some(State::PowerUp));

    // SRX, then nXS before the activate, then the usual read path
    let (_, depart) = recorder.served()[0];
    assert!(depart >= entered + n_xs + 11 + 15);
}
