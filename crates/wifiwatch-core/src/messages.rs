//! User-facing texts and the keyboards offered with them
//!
//! The bot speaks Russian; command texts double as button labels so a
//! tap on the offered button sends the matching command back.

use crate::traits::ReplyKeyboard;

/// Command that subscribes the sender
pub const START_COMMAND: &str = "Начать отслеживание";

/// Command that unsubscribes the sender
pub const STOP_COMMAND: &str = "Остановить отслеживание";

/// Sent to the allow-list when the daemon comes up
pub const MONITOR_STARTED: &str = "Отслеживание wifi сети запущено";

/// Sent to every subscriber when the target network reappears
pub const POWER_RESTORED: &str = "Электропитание дома возобновлено✅";

/// Confirmation after a successful subscribe
pub const SUBSCRIBED: &str = "Отслеживание запущено. Сообщу, когда электропитание вернётся.";

/// Confirmation after a successful unsubscribe
pub const UNSUBSCRIBED: &str = "Отслеживание остановлено.";

/// Sent to chats outside the allow-list
pub const ACCESS_DENIED: &str = "У вас нет доступа к этому боту. Обратитесь к администратору.";

/// Keyboard offering the start command
pub fn start_keyboard() -> ReplyKeyboard {
    ReplyKeyboard::single(START_COMMAND)
}

/// Keyboard offering the stop command
pub fn stop_keyboard() -> ReplyKeyboard {
    ReplyKeyboard::single(STOP_COMMAND)
}
