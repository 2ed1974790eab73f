use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use trucktalk_core::{PermissionKind, PermissionPrompt};

/// Blocking modal confirmation backed by a native dialog.
///
/// Two outcomes only; the dialog cannot be dismissed by clicking outside
/// it. The gate bridges the block through `spawn_blocking`.
pub struct RfdPrompt;

impl PermissionPrompt for RfdPrompt {
    fn confirm(&self, kind: PermissionKind) -> bool {
        let description = match kind {
            PermissionKind::Playback => {
                "TruckTalk needs to play audio for this lesson. Enable audio playback?"
            }
            PermissionKind::Microphone => {
                "TruckTalk needs the microphone to record your pronunciation. Enable it?"
            }
        };

        let result = MessageDialog::new()
            .set_title("TruckTalk")
            .set_level(MessageLevel::Info)
            .set_description(description)
            .set_buttons(MessageButtons::OkCancel)
            .show();

        matches!(result, MessageDialogResult::Ok)
    }
}
