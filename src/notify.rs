/// file: src/notify.rs
/// description: side channels for alert notifications (toast surface and audio cue)
use crate::{
    error::Result,
    types::{AlertCondition, AlertNotification},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Renderable description of one triggered alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertToast {
    pub alert_id: Option<i64>,
    pub crypto_name: String,
    pub crypto_image: Option<String>,
    pub condition: &'static str,
    pub direction: Option<Direction>,
    pub target: f64,
    pub current: f64,
}

impl From<AlertNotification> for AlertToast {
    fn from(alert: AlertNotification) -> Self {
        let direction = match alert.alert_condition {
            AlertCondition::PriceAbove => Some(Direction::Up),
            AlertCondition::PriceBelow => Some(Direction::Down),
            AlertCondition::Other => None,
        };
        Self {
            condition: alert.condition_label(),
            alert_id: alert.alert_id,
            crypto_name: alert.crypto_name,
            crypto_image: alert.crypto_image,
            direction,
            target: alert.threshold_value,
            current: alert.current_price,
        }
    }
}

/// Visual notification surface.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: AlertToast) -> Result<()>;
}

/// Best-effort audio cue; callers swallow failures.
pub trait AudioCue: Send + Sync {
    fn play(&self) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl AudioCue for Silent {
    fn play(&self) -> Result<()> {
        Ok(())
    }
}
