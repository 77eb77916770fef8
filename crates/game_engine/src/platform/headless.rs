//! Window-less platform
//!
//! Replays scripted events on chosen frames and advances a simulated clock
//! by a fixed amount per frame, so runs are deterministic.

use std::collections::BTreeMap;

use super::{AppEvent, Platform};

/// Scripted platform without a window
#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    width: u32,
    height: u32,
    title: String,
    frame: u64,
    frame_limit: Option<u64>,
    frame_time: f64,
    time: f64,
    close_requested: bool,
    script: BTreeMap<u64, Vec<AppEvent>>,
}

impl HeadlessPlatform {
    /// Default simulated frame time (60 Hz)
    pub const DEFAULT_FRAME_TIME: f64 = 1.0 / 60.0;

    /// Platform with the given framebuffer size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            title: String::new(),
            frame: 0,
            frame_limit: None,
            frame_time: Self::DEFAULT_FRAME_TIME,
            time: 0.0,
            close_requested: false,
            script: BTreeMap::new(),
        }
    }

    /// Builder: close after this many polled frames
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Builder: simulated seconds per frame
    pub fn with_frame_time(mut self, seconds: f64) -> Self {
        self.frame_time = seconds.max(0.0);
        self
    }

    /// Deliver `event` on the given frame (0 is the first poll)
    pub fn script(&mut self, frame: u64, event: AppEvent) {
        self.script.entry(frame).or_default().push(event);
    }

    /// Frames polled so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Last title set
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Platform for HeadlessPlatform {
    fn poll_events(&mut self) -> Vec<AppEvent> {
        let events = self.script.remove(&self.frame).unwrap_or_default();
        for event in &events {
            if let AppEvent::WindowResized { width, height } = *event {
                self.width = width;
                self.height = height;
            }
        }
        self.frame += 1;
        self.time += self.frame_time;
        events
    }

    fn should_close(&self) -> bool {
        self.close_requested || self.frame_limit.is_some_and(|limit| self.frame >= limit)
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn test_scripted_events_arrive_on_their_frame() {
        let mut platform = HeadlessPlatform::new(640, 480);
        let press = AppEvent::KeyInput {
            key: KeyCode::Space,
            pressed: true,
        };
        platform.script(1, press);

        assert!(platform.poll_events().is_empty());
        assert_eq!(platform.poll_events(), vec![press]);
        assert!(platform.poll_events().is_empty());
    }

    #[test]
    fn test_frame_limit_and_clock() {
        let mut platform = HeadlessPlatform::new(1, 1).with_frame_limit(2).with_frame_time(0.5);
        assert!(!platform.should_close());
        platform.poll_events();
        platform.poll_events();
        assert!(platform.should_close());
        assert_eq!(platform.time(), 1.0);
    }

    #[test]
    fn test_resize_updates_framebuffer() {
        let mut platform = HeadlessPlatform::new(800, 600);
        platform.script(0, AppEvent::WindowResized { width: 1024, height: 768 });
        platform.poll_events();
        assert_eq!(platform.framebuffer_size(), (1024, 768));

        platform.request_close();
        assert!(platform.should_close());
    }
}
