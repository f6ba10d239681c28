//! Lazy DBSCAN.
//!
//! Each pull on [`DbScan`] yields one [`Cluster`] cursor. A cluster starts at
//! the first unclassified input point whose neighborhood is dense (at least
//! `min_pts` points counting itself). Its members are discovered while the
//! cluster cursor is consumed: queued neighbors are emitted in order, and
//! those that are core points themselves pull their own neighborhoods in.
//! Points found sparse while scanning the input are marked noise and
//! buffered; a dense neighborhood later reclaims them as border points.
//! Once the input is exhausted a final cursor with classification
//! [`Classification::Noise`] yields the buffered points still marked noise.
//!
//! Cluster cursors share the operator's state and are valid only until the
//! parent produces the next one. Anything left unread is drained (and thus
//! classified) before that happens.

use std::cell::RefCell;
use std::rc::Rc;

use seqops_core::cursor::{Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};
use seqops_core::id::ClusterId;

use crate::cluster::point::{Classification, PointRef};
use crate::cluster::queue::Queue;
use crate::cluster::{RangeQuery, SearchRegion};
use crate::metrics::emit_event;

/// What the live child cursor is emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emitting {
    Nothing,
    Cluster(ClusterId),
    Noise,
}

struct ScanState<T, I, Q> {
    input: I,
    range: Q,
    eps: f64,
    min_pts: usize,
    next_id: ClusterId,
    live: u64,
    emitting: Emitting,
    emitted: u64,
    /// Core point that opened the live cluster, not yet handed out.
    seed: Option<PointRef<T>>,
    expansion: Queue<PointRef<T>>,
    /// Noise points reclaimed by the live cluster.
    changed: Queue<PointRef<T>>,
    noise: Queue<PointRef<T>>,
    noise_pass_done: bool,
}

impl<T, I, Q> ScanState<T, I, Q>
where
    I: Cursor<Item = PointRef<T>>,
    Q: RangeQuery<T>,
{
    /// Neighbors of `p` (excluding `p`) if `p` is a core point.
    fn dense_neighborhood(&mut self, p: &PointRef<T>) -> Result<Option<Vec<PointRef<T>>>> {
        let region = SearchRegion {
            center: p.value(),
            eps: self.eps,
        };
        let mut hood = self.range.query(&region)?;
        hood.open()?;

        let needed = self.min_pts - 1;
        let mut found = Vec::new();
        while found.len() < needed && hood.has_next()? {
            let q = hood.next()?;
            if !Rc::ptr_eq(&q, p) {
                found.push(q);
            }
        }
        if found.len() < needed {
            hood.close();
            return Ok(None);
        }
        while hood.has_next()? {
            let q = hood.next()?;
            if !Rc::ptr_eq(&q, p) {
                found.push(q);
            }
        }
        hood.close();
        Ok(Some(found))
    }

    fn absorb(&mut self, neighbors: Vec<PointRef<T>>, id: ClusterId) -> Result<()> {
        for q in neighbors {
            match q.classification() {
                Classification::Unclassified => {
                    q.assign(id);
                    self.expansion.enqueue(q)?;
                }
                Classification::Noise => {
                    q.assign(id);
                    self.changed.enqueue(q)?;
                }
                Classification::Cluster(_) => {}
            }
        }
        Ok(())
    }

    fn next_member(&mut self, id: ClusterId) -> Result<Option<PointRef<T>>> {
        let member = if let Some(p) = self.seed.take() {
            Some(p)
        } else if let Some(p) = self.changed.dequeue()? {
            Some(p)
        } else if let Some(p) = self.expansion.dequeue()? {
            if let Some(hood) = self.dense_neighborhood(&p)? {
                self.absorb(hood, id)?;
            }
            Some(p)
        } else {
            None
        };
        if member.is_some() {
            self.emitted += 1;
        }
        Ok(member)
    }

    fn next_noise(&mut self) -> Result<Option<PointRef<T>>> {
        while let Some(p) = self.noise.dequeue()? {
            if p.classification().is_noise() {
                self.emitted += 1;
                return Ok(Some(p));
            }
        }
        Ok(None)
    }

    fn next_of(&mut self, emitting: Emitting) -> Result<Option<PointRef<T>>> {
        match emitting {
            Emitting::Cluster(id) => self.next_member(id),
            Emitting::Noise => self.next_noise(),
            Emitting::Nothing => Ok(None),
        }
    }

    /// Classify and discard whatever the live child left unread.
    fn finish_current(&mut self) -> Result<()> {
        let emitting = self.emitting;
        while self.next_of(emitting)?.is_some() {}
        if let Emitting::Cluster(id) = emitting {
            emit_event("cluster_done", &[("cluster", id.get()), ("size", self.emitted)]);
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.live += 1;
        self.emitting = Emitting::Nothing;
        self.emitted = 0;
        self.seed = None;
    }

    /// Scan the input for the next core point, marking sparse ones as noise.
    fn start_cluster(&mut self) -> Result<Option<ClusterId>> {
        while self.input.has_next()? {
            let p = self.input.next()?;
            if !p.classification().is_unclassified() {
                continue;
            }
            match self.dense_neighborhood(&p)? {
                Some(hood) => {
                    let id = self.next_id;
                    self.next_id = id.succ();
                    p.assign(id);
                    self.absorb(hood, id)?;
                    self.seed = Some(p);
                    return Ok(Some(id));
                }
                None => {
                    p.mark_noise();
                    self.noise.enqueue(p)?;
                }
            }
        }
        Ok(None)
    }

    /// Keep only points that are still noise; true if any remain.
    fn start_noise_pass(&mut self) -> Result<bool> {
        let mut remaining = 0u64;
        let total = self.noise.len();
        for _ in 0..total {
            if let Some(p) = self.noise.dequeue()? {
                if p.classification().is_noise() {
                    remaining += 1;
                    self.noise.enqueue(p)?;
                }
            }
        }
        emit_event(
            "noise_pass",
            &[("buffered", total as u64), ("noise", remaining)],
        );
        Ok(remaining > 0)
    }
}

type Shared<T, I, Q> = Rc<RefCell<ScanState<T, I, Q>>>;

/// Producer half of [`DbScan`].
struct Clusters<T, I, Q>(Shared<T, I, Q>);

impl<T, I, Q> Fetch for Clusters<T, I, Q>
where
    I: Cursor<Item = PointRef<T>>,
    Q: RangeQuery<T>,
{
    type Item = Cluster<T, I, Q>;

    fn fetch(&mut self) -> Result<Option<Cluster<T, I, Q>>> {
        let mut st = self.0.borrow_mut();
        st.finish_current()?;
        st.invalidate();

        let class = match st.start_cluster()? {
            Some(id) => {
                st.emitting = Emitting::Cluster(id);
                Classification::Cluster(id)
            }
            None if !st.noise_pass_done => {
                st.noise_pass_done = true;
                if !st.start_noise_pass()? {
                    return Ok(None);
                }
                st.emitting = Emitting::Noise;
                Classification::Noise
            }
            None => return Ok(None),
        };

        Ok(Some(Cluster {
            lookahead: Lookahead::opened(),
            members: Members {
                shared: Rc::clone(&self.0),
                generation: st.live,
            },
            class,
        }))
    }
}

pub struct DbScan<T, I, Q> {
    lookahead: Lookahead<Cluster<T, I, Q>>,
    clusters: Clusters<T, I, Q>,
}

impl<T, I, Q> DbScan<T, I, Q>
where
    I: Cursor<Item = PointRef<T>>,
    Q: RangeQuery<T>,
{
    /// `min_pts` counts the point itself; `eps` is the neighborhood radius
    /// handed to the range query.
    pub fn new(input: I, range: Q, eps: f64, min_pts: usize) -> Result<Self> {
        if min_pts == 0 {
            return Err(Error::InvalidArgument("min_pts must be positive".into()));
        }
        if eps.is_nan() || eps < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "eps must be a non-negative number, got {eps}"
            )));
        }
        Ok(Self {
            lookahead: Lookahead::new(),
            clusters: Clusters(Rc::new(RefCell::new(ScanState {
                input,
                range,
                eps,
                min_pts,
                next_id: ClusterId::new(0),
                live: 0,
                emitting: Emitting::Nothing,
                emitted: 0,
                seed: None,
                expansion: Queue::fifo(),
                changed: Queue::lifo(),
                noise: Queue::fifo(),
                noise_pass_done: false,
            }))),
        })
    }

    /// Clusters started so far.
    pub fn clusters_found(&self) -> u64 {
        self.clusters.0.borrow().next_id.get()
    }
}

impl<T, I, Q> Cursor for DbScan<T, I, Q>
where
    I: Cursor<Item = PointRef<T>>,
    Q: RangeQuery<T>,
{
    type Item = Cluster<T, I, Q>;

    fn open(&mut self) -> Result<()> {
        let clusters = &self.clusters;
        self.lookahead.open_with(|| {
            let mut st = clusters.0.borrow_mut();
            st.expansion.open()?;
            st.changed.open()?;
            st.noise.open()?;
            st.input.open()
        })
    }

    fn close(&mut self) {
        {
            let mut st = self.clusters.0.borrow_mut();
            st.input.close();
            st.expansion.close();
            st.changed.close();
            st.noise.close();
            st.invalidate();
        }
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.clusters)
    }

    fn next(&mut self) -> Result<Self::Item> {
        self.lookahead.next(&mut self.clusters)
    }

    fn peek(&mut self) -> Result<&Self::Item> {
        self.lookahead.peek(&mut self.clusters)
    }
}

struct Members<T, I, Q> {
    shared: Shared<T, I, Q>,
    generation: u64,
}

impl<T, I, Q> Members<T, I, Q> {
    fn check_live(&self) -> Result<()> {
        if self.shared.borrow().live != self.generation {
            return Err(Error::InvalidState(
                "stale cluster: the parent cursor has advanced past it".into(),
            ));
        }
        Ok(())
    }
}

impl<T, I, Q> Fetch for Members<T, I, Q>
where
    I: Cursor<Item = PointRef<T>>,
    Q: RangeQuery<T>,
{
    type Item = PointRef<T>;

    fn fetch(&mut self) -> Result<Option<PointRef<T>>> {
        self.check_live()?;
        let mut st = self.shared.borrow_mut();
        let emitting = st.emitting;
        st.next_of(emitting)
    }
}

/// Members of one cluster, or the final noise points.
pub struct Cluster<T, I, Q> {
    lookahead: Lookahead<PointRef<T>>,
    members: Members<T, I, Q>,
    class: Classification,
}

impl<T, I, Q> Cluster<T, I, Q> {
    /// `Cluster(id)` for a cluster, `Noise` for the final noise cursor.
    pub fn classification(&self) -> Classification {
        self.class
    }

    pub fn id(&self) -> Option<ClusterId> {
        self.class.cluster_id()
    }

    pub fn is_stale(&self) -> bool {
        self.members.check_live().is_err()
    }
}

impl<T, I, Q> Cursor for Cluster<T, I, Q>
where
    I: Cursor<Item = PointRef<T>>,
    Q: RangeQuery<T>,
{
    type Item = PointRef<T>;

    fn open(&mut self) -> Result<()> {
        self.lookahead.open().map(|_| ())
    }

    fn close(&mut self) {
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.check_open()?;
        self.members.check_live()?;
        self.lookahead.has_next(&mut self.members)
    }

    fn next(&mut self) -> Result<PointRef<T>> {
        self.lookahead.check_open()?;
        self.members.check_live()?;
        self.lookahead.next(&mut self.members)
    }

    fn peek(&mut self) -> Result<&PointRef<T>> {
        self.lookahead.check_open()?;
        self.members.check_live()?;
        self.lookahead.peek(&mut self.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{linear_scan, points};
    use crate::source::VecSource;
    use seqops_core::cursor::drain;
    use seqops_core::ErrorKind;

    fn dist(a: &f64, b: &f64) -> f64 {
        (a - b).abs()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let pts = points(vec![0.0f64]);
        let err = DbScan::new(VecSource::new(pts.clone()), linear_scan(&pts, dist), 1.0, 0)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = DbScan::new(VecSource::new(pts.clone()), linear_scan(&pts, dist), -0.5, 2)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = DbScan::new(VecSource::new(pts.clone()), linear_scan(&pts, dist), f64::NAN, 2)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_stale_cluster_is_rejected() {
        let pts = points(vec![0.0, 0.5, 10.0, 10.5]);
        let mut scan = DbScan::new(VecSource::new(pts.clone()), linear_scan(&pts, dist), 1.0, 2)
            .unwrap();
        scan.open().unwrap();
        let mut first = scan.next().unwrap();
        let mut second = scan.next().unwrap();
        assert!(first.is_stale());
        assert_eq!(first.has_next().unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(drain(&mut second).unwrap().len(), 2);
        assert_eq!(pts[1].classification(), Classification::Cluster(ClusterId::new(0)));
    }
}
