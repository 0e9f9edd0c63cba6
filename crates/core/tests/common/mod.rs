//! Shared test harness.
//!
//! Builders for single-channel controllers over various standards, plus a
//! completion recorder that captures (arrive, depart) pairs from request
//! callbacks.

use std::cell::RefCell;
use std::rc::Rc;

use dramsim_core::controller::Controller;
use dramsim_core::request::{Callback, ReqKind, Request};
use dramsim_core::spec::{Level, Spec};
use dramsim_core::standards;

/// Gives a chip-table spec a concrete system shape so a controller can be
/// built without the memory factory.
pub fn shape(mut spec: Spec, channels: u32, ranks: u32) -> Spec {
    spec.org.count[0] = channels;
    if let Some(rank_level) = spec.level_index(Level::Rank) {
        spec.org.count[rank_level] = ranks;
    }
    spec
}

/// A single-channel, single-rank DDR3-1600K controller.
pub fn ddr3_controller() -> Controller {
    let spec = shape(
        standards::ddr3::spec("DDR3_2Gb_x8", "DDR3_1600K").unwrap(),
        1,
        1,
    );
    Controller::new(spec, 0)
}

/// Completion recorder: collects (arrive, depart) per served request.
#[derive(Clone, Default)]
pub struct Recorder {
    served: Rc<RefCell<Vec<(i64, i64)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> Callback {
        let served = Rc::clone(&self.served);
        Rc::new(move |req: &Request| {
            served.borrow_mut().push((req.arrive, req.depart));
        })
    }

    /// A read request through this recorder.
    pub fn read(&self, addr_vec: Vec<i32>) -> Request {
        let mut req = Request::with_addr_vec(addr_vec, ReqKind::Read);
        req.callback = Some(self.callback());
        req
    }

    pub fn count(&self) -> usize {
        self.served.borrow().len()
    }

    pub fn served(&self) -> Vec<(i64, i64)> {
        self.served.borrow().clone()
    }
}

/// Ticks until the recorder has seen `n` completions, with a safety bound.
pub fn tick_until(ctrl: &mut Controller, recorder: &Recorder, n: usize, max_ticks: usize) {
    for _ in 0..max_ticks {
        if recorder.count() >= n {
            return;
        }
        ctrl.tick();
    }
    panic!(
        "no completion after {} ticks ({} of {} served)",
        max_ticks,
        recorder.count(),
        n
    );
}
