//! TLDRAM controller behavior: migration flow and segment timing.

use crate::common::{shape, Recorder};
use dramsim_core::controller::TldramController;
use dramsim_core::standards;

fn controller() -> TldramController {
    let spec = shape(
        standards::tldram::spec("TLDRAM_2Gb_x8", "TLDRAM_1600K").unwrap(),
        1,
        1,
    );
    TldramController::new(spec, 0)
}

fn run_read(ctrl: &mut TldramController, recorder: &Recorder, addr: Vec<i32>) -> (i64, i64) {
    let before = recorder.count();
    assert!(ctrl.enqueue(recorder.read(addr)));
    for _ in 0..500 {
        if recorder.count() > before {
            return recorder.served()[before];
        }
        ctrl.tick();
    }
    panic!("read never completed");
}

// ══════════════════════════════════════════════════════════
// 1. A read becomes a migration: ACTM + MIG with migration timing
// ══════════════════════════════════════════════════════════

#[test]
fn read_migrates_through_the_fast_segment() {
    let mut ctrl = controller();
    let recorder = Recorder::new();
    let spec = &ctrl.controller().spec;
    let (n_rcd_m, latency) = (spec.speed.n_rcd_m, spec.read_latency);

    // far-segment row 33: ACTM next cycle, MIG after the migration
    // RAS-to-CAS delay, then data
    let (arrive, depart) = run_read(&mut ctrl, &recorder, vec![0, 0, 0, 33, 0]);
    assert_eq!(depart - arrive, 1 + n_rcd_m + latency);
    assert_eq!(ctrl.controller().stats.row_misses, 1);
    assert_eq!(ctrl.controller().stats.reads_served, 1);
}

// ══════════════════════════════════════════════════════════
// 2. Migration reuses the open row: the second access is a hit
// ══════════════════════════════════════════════════════════

#[test]
fn second_access_hits_migrated_row() {
    let mut ctrl = controller();
    let recorder = Recorder::new();

    let _ = run_read(&mut ctrl, &recorder, vec![0, 0, 0, 33, 0]);
    let (arrive, depart) = run_read(&mut ctrl, &recorder, vec![0, 0, 0, 33, 1]);
    let latency = ctrl.controller().spec.read_latency;
    // no activate needed the second time
    assert_eq!(depart - arrive, 1 + latency);
    assert_eq!(ctrl.controller().stats.row_hits, 1);
}
