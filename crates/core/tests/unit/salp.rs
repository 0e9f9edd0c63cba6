//! SALP behavior through the controller.

use crate::common::{shape, tick_until, Recorder};
use dramsim_core::controller::Controller;
use dramsim_core::spec::State;
use dramsim_core::standards;

fn masa_controller() -> Controller {
    let spec = shape(
        standards::salp::spec("SALP_2Gb_x8", "SALP_1600K", "SALP-MASA", 8).unwrap(),
        1,
        1,
    );
    Controller::new(spec, 0)
}

// ══════════════════════════════════════════════════════════
// 1. Two subarrays of one bank hold open rows at once under MASA
// ══════════════════════════════════════════════════════════

#[test]
fn masa_keeps_multiple_subarrays_open() {
    let mut ctrl = masa_controller();
    let recorder = Recorder::new();

    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 2, 5, 0])));
    tick_until(&mut ctrl, &recorder, 1, 100);
    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 3, 9, 0])));
    tick_until(&mut ctrl, &recorder, 2, 200);

    let bank = &ctrl.channel.children[0].children[0];
    assert_eq!(bank.children[2].state, Some(State::Opened));
    assert_eq!(bank.children[3].state, Some(State::Selected));
    assert!(bank.children[2].row_state.contains_key(&5));
    assert!(bank.children[3].row_state.contains_key(&9));
}

// ══════════════════════════════════════════════════════════
// 2. Returning to a deselected subarray is a SASEL, not a full
//    activate cycle
// ══════════════════════════════════════════════════════════

#[test]
fn reselect_costs_less_than_reactivate() {
    let mut ctrl = masa_controller();
    let recorder = Recorder::new();

    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 2, 5, 0])));
    tick_until(&mut ctrl, &recorder, 1, 100);
    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 3, 9, 0])));
    tick_until(&mut ctrl, &recorder, 2, 200);

    // subarray 2 is open but deselected; the read needs SASEL + RD only
    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 2, 5, 1])));
    tick_until(&mut ctrl, &recorder, 3, 200);
    let (arrive, depart) = recorder.served()[2];
    let n_scd = ctrl.spec.speed.n_scd;
    // SASEL next cycle, the column command an nSCD later, then data
    assert_eq!(depart - arrive, 1 + n_scd + 15);
    // and it still counts as a row hit
    assert!(ctrl.stats.row_hits >= 1);
}

// ══════════════════════════════════════════════════════════
// 3. Refresh under SALP precharges the whole rank with PRER
// ══════════════════════════════════════════════════════════

#[test]
fn refresh_closes_all_subarrays() {
    let spec = {
        let mut s = shape(
            standards::salp::spec("SALP_2Gb_x8", "SALP_1600K", "SALP-MASA", 8).unwrap(),
            1,
            1,
        );
        s.speed.n_refi = 150;
        s
    };
    let mut ctrl = Controller::new(spec, 0);
    let recorder = Recorder::new();

    assert!(ctrl.enqueue(recorder.read(vec![0, 0, 0, 2, 5, 0])));
    tick_until(&mut ctrl, &recorder, 1, 100);
    assert!(!ctrl.row_table().is_empty());

    for _ in 0..400 {
        ctrl.tick();
    }
    assert!(ctrl.stats.refreshes_issued >= 1);
    assert!(ctrl.row_table().is_empty());
    let bank = &ctrl.channel.children[0].children[0];
    assert!(bank
        .children
        .iter()
        .all(|sa| sa.state == Some(State::Closed)));
}
