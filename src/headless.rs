//! In-memory windowing backend
//!
//! Records what a real backend would draw and logs it. Used by `--headless`
//! and by tests, which can also deny permission, swap screen metrics, and
//! inject backend failures.

use crate::overlay::{
    Dispatcher, Geometry, LayoutSpec, ScreenMetrics, SurfaceError, SurfaceFrame, VisualDescriptor,
    Windowing,
};
use crate::server::Envelope;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Handle to one recorded surface
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessHandle(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSurface {
    pub geometry: Geometry,
    pub layout: LayoutSpec,
    pub transparency: f64,
    pub visual: VisualDescriptor,
}

#[derive(Debug)]
pub struct HeadlessWindowing {
    screen: ScreenMetrics,
    permitted: bool,
    fail_next: Option<SurfaceError>,
    surfaces: HashMap<u64, HeadlessSurface>,
    next_handle: u64,
    foreground_requests: usize,
}

impl HeadlessWindowing {
    pub fn new(screen: ScreenMetrics) -> Self {
        Self {
            screen,
            permitted: true,
            fail_next: None,
            surfaces: HashMap::new(),
            next_handle: 1,
            foreground_requests: 0,
        }
    }

    pub fn set_screen(&mut self, screen: ScreenMetrics) {
        self.screen = screen;
    }

    pub fn set_permission(&mut self, permitted: bool) {
        self.permitted = permitted;
    }

    /// Make the next surface operation fail with `err`.
    pub fn fail_next(&mut self, err: SurfaceError) {
        self.fail_next = Some(err);
    }

    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    /// The live surface, if exactly one exists.
    pub fn surface(&self) -> Option<&HeadlessSurface> {
        match self.surfaces.len() {
            1 => self.surfaces.values().next(),
            _ => None,
        }
    }

    pub fn foreground_requests(&self) -> usize {
        self.foreground_requests
    }

    fn lookup(&mut self, handle: &HeadlessHandle) -> Result<&mut HeadlessSurface, SurfaceError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        self.surfaces.get_mut(&handle.0).ok_or(SurfaceError::Lost)
    }
}

impl Windowing for HeadlessWindowing {
    type Handle = HeadlessHandle;

    fn screen(&self) -> ScreenMetrics {
        self.screen
    }

    fn may_draw_overlay(&self) -> bool {
        self.permitted
    }

    fn attach(&mut self, frame: &SurfaceFrame) -> Result<HeadlessHandle, SurfaceError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        let id = self.next_handle;
        self.next_handle += 1;
        self.surfaces.insert(
            id,
            HeadlessSurface {
                geometry: frame.geometry,
                layout: frame.layout,
                transparency: frame.transparency,
                visual: frame.visual.clone(),
            },
        );
        info!(
            "[headless] attach #{id} {:?} alpha {:.2} text {:?}",
            frame.geometry, frame.transparency, frame.visual.countdown_text
        );
        Ok(HeadlessHandle(id))
    }

    fn render(
        &mut self,
        handle: &mut HeadlessHandle,
        visual: &VisualDescriptor,
    ) -> Result<(), SurfaceError> {
        let surface = self.lookup(handle)?;
        surface.visual = visual.clone();
        debug!(
            "[headless] render #{} {:?} {}",
            handle.0,
            visual.active_light().map(|l| l.color.as_str()),
            visual.countdown_text
        );
        Ok(())
    }

    fn reshape(
        &mut self,
        handle: &mut HeadlessHandle,
        geometry: Geometry,
        layout: &LayoutSpec,
    ) -> Result<(), SurfaceError> {
        let surface = self.lookup(handle)?;
        surface.geometry = geometry;
        surface.layout = *layout;
        debug!("[headless] reshape #{} {:?}", handle.0, geometry);
        Ok(())
    }

    fn set_transparency(
        &mut self,
        handle: &mut HeadlessHandle,
        alpha: f64,
    ) -> Result<(), SurfaceError> {
        let surface = self.lookup(handle)?;
        surface.transparency = alpha;
        Ok(())
    }

    fn detach(&mut self, handle: HeadlessHandle) {
        if self.surfaces.remove(&handle.0).is_some() {
            info!("[headless] detach #{}", handle.0);
        }
    }

    fn bring_host_to_foreground(&mut self) {
        self.foreground_requests += 1;
        info!("[headless] foreground requested");
    }
}

/// Owner loop for headless mode: apply envelopes in arrival order until
/// every sender is gone.
pub fn run_owner(
    ws: &mut HeadlessWindowing,
    dispatcher: &mut Dispatcher<HeadlessHandle>,
    mut rx: mpsc::Receiver<Envelope>,
) {
    while let Some(envelope) = rx.blocking_recv() {
        let result = dispatcher.dispatch(ws, &envelope.command);
        // Client may have hung up
        let _ = envelope.reply.send(result);
    }
    dispatcher.shutdown(ws);
    debug!("[headless] owner loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{CommandParams, Outcome, RawCommand};
    use tokio::sync::oneshot;

    #[test]
    fn owner_loop_applies_in_order_and_replies() {
        let (tx, rx) = mpsc::channel(8);
        let mut replies = Vec::new();
        for action in ["updateState", "create", "updateState", "stop"] {
            let (reply, reply_rx) = oneshot::channel();
            tx.try_send(Envelope {
                command: RawCommand::new(action, CommandParams::default()),
                reply,
            })
            .unwrap();
            replies.push(reply_rx);
        }
        drop(tx);

        let mut ws = HeadlessWindowing::new(ScreenMetrics::new(800, 600, 1.0));
        let mut dispatcher = Dispatcher::default();
        run_owner(&mut ws, &mut dispatcher, rx);

        let outcomes: Vec<_> = replies
            .into_iter()
            .map(|mut r| r.try_recv().unwrap())
            .collect();
        assert_eq!(
            outcomes,
            vec![
                Ok(Outcome::Dropped),
                Ok(Outcome::Applied),
                Ok(Outcome::Applied),
                Ok(Outcome::Applied),
            ]
        );
        assert_eq!(ws.live_surfaces(), 0);
    }

    #[test]
    fn stale_handle_reports_lost() {
        let mut ws = HeadlessWindowing::new(ScreenMetrics::new(800, 600, 1.0));
        let mut handle = HeadlessHandle(42);
        assert_eq!(
            ws.set_transparency(&mut handle, 0.5),
            Err(SurfaceError::Lost)
        );
    }
}
