use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PageStatus {
    Idle,
    Loading,
    Ready,
    Unauthorized,
    Error,
}

/// What a page renders: status plus optional payload and user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageState<T> {
    pub status: PageStatus,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> PageState<T> {
    pub fn idle() -> Self {
        Self {
            status: PageStatus::Idle,
            data: None,
            message: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            status: PageStatus::Loading,
            ..Self::idle()
        }
    }

    pub fn ready(data: T) -> Self {
        Self {
            status: PageStatus::Ready,
            data: Some(data),
            message: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: PageStatus::Unauthorized,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: PageStatus::Error,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == PageStatus::Ready
    }

    /// `Ready`, `Unauthorized` and `Error` end a mount.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            PageStatus::Ready | PageStatus::Unauthorized | PageStatus::Error
        )
    }
}
