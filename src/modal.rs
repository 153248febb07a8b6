use std::sync::Arc;

use crate::logging::{log_transition, Domain};
use crate::page::ModalSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open,
}

impl ModalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModalState::Closed => "closed",
            ModalState::Open => "open",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalEvent {
    /// Any trigger element was activated.
    Trigger,
    /// The close control was activated. Does not propagate to the backdrop.
    CloseControl,
    /// A click inside the modal container; `on_backdrop` is false for descendants.
    Click { on_backdrop: bool },
    KeyDown { key: String },
}

pub struct ModalController<M: ModalSurface + ?Sized> {
    surface: Arc<M>,
    state: ModalState,
}

impl<M: ModalSurface + ?Sized> ModalController<M> {
    pub fn new(surface: Arc<M>) -> Self {
        Self {
            surface,
            state: ModalState::Closed,
        }
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ModalState::Open
    }

    pub fn handle(&mut self, event: ModalEvent) -> ModalState {
        match (self.state, event) {
            (ModalState::Closed, ModalEvent::Trigger) => self.open(),
            (ModalState::Open, ModalEvent::CloseControl) => self.close(),
            (ModalState::Open, ModalEvent::Click { on_backdrop: true }) => self.close(),
            (ModalState::Open, ModalEvent::KeyDown { key }) if key == "Escape" => self.close(),
            _ => {}
        }
        self.state
    }

    pub fn open(&mut self) {
        if !self.surface.has_modal() || self.is_open() {
            return;
        }
        self.surface.set_modal_hidden(false);
        self.surface.set_scroll_locked(true);
        self.transition(ModalState::Open);
    }

    /// Closing a closed modal writes nothing.
    pub fn close(&mut self) {
        if !self.surface.has_modal() || !self.is_open() {
            return;
        }
        self.surface.set_modal_hidden(true);
        self.surface.set_scroll_locked(false);
        self.transition(ModalState::Closed);
    }

    fn transition(&mut self, next: ModalState) {
        log_transition(Domain::Modal, self.state.as_str(), next.as_str());
        self.state = next;
    }
}
