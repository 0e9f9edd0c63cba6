//! Memory requests and completion callbacks.
//!
//! Requests are value-typed: they move between the controller queues and the
//! pending deque, and the completion callback is reference-counted so a
//! request can be cloned where bookkeeping needs a copy.

use std::fmt;
use std::rc::Rc;

/// What a request asks the DRAM system to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReqKind {
    Read,
    Write,
    Refresh,
    PowerDown,
    SelfRefresh,
    /// Standard-specific extension (TLDRAM migration).
    Extension,
}

impl ReqKind {
    /// Number of request kinds; sizes the per-kind translate table.
    pub const COUNT: usize = 6;

    /// Table index of this kind.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Completion callback, invoked exactly once when the request finishes.
pub type Callback = Rc<dyn Fn(&Request)>;

/// One memory request, carrying its decoded address through the controller.
#[derive(Clone)]
pub struct Request {
    /// Physical byte address.
    pub addr: u64,
    /// One index per hierarchy level; -1 is a wildcard.
    pub addr_vec: Vec<i32>,
    pub kind: ReqKind,
    /// Clock at which the controller accepted the request.
    pub arrive: i64,
    /// Clock at which data returns (reads) or the short-circuit fires.
    pub depart: i64,
    /// Set until the controller issues the first command on behalf of this
    /// request; drives the row hit/miss/conflict accounting.
    pub is_first_command: bool,
    /// Issuing core, for per-core statistics.
    pub coreid: usize,
    /// HMC: number of CAS bursts needed to move the payload.
    pub burst_count: u32,
    pub callback: Option<Callback>,
}

impl Request {
    /// A request by physical address; the address vector is filled in by the
    /// memory front-end during decode.
    pub fn new(addr: u64, kind: ReqKind, callback: Option<Callback>) -> Self {
        Self {
            addr,
            addr_vec: Vec::new(),
            kind,
            arrive: -1,
            depart: -1,
            is_first_command: true,
            coreid: 0,
            burst_count: 1,
            callback,
        }
    }

    /// A request with a pre-decoded address vector (used by the refresh
    /// engine, which targets hierarchy coordinates rather than addresses).
    pub fn with_addr_vec(addr_vec: Vec<i32>, kind: ReqKind) -> Self {
        Self {
            addr: 0,
            addr_vec,
            kind,
            arrive: -1,
            depart: -1,
            is_first_command: true,
            coreid: 0,
            burst_count: 1,
            callback: None,
        }
    }

    /// Invokes the completion callback, if any.
    pub fn complete(&self) {
        if let Some(cb) = &self.callback {
            cb(self);
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("addr_vec", &self.addr_vec)
            .field("kind", &self.kind)
            .field("arrive", &self.arrive)
            .field("depart", &self.depart)
            .finish_non_exhaustive()
    }
}
