use crate::device::{CommandListExt, Device};
use crate::handle::TokenBufferId;
use crate::scene::Segment;
use crate::version::ChangeVersion;

use super::backend::{ReplayBackend, ReplayData};
use super::{DrawMode, FrameContext, ReplayStats};

/// Token buffer uploaded once and replayed by segment arrays.
///
/// Version changes only refresh the segment arrays; the uploaded bytes stay.
#[derive(Debug, Default)]
pub(crate) struct BufferBackend {
    buffer: Option<TokenBufferId>,
    segments: Vec<Segment>,
}

fn extension(device: &mut dyn Device) -> &mut dyn CommandListExt {
    device
        .command_list()
        .expect("buffer replay is only selectable with command-list support")
}

impl ReplayBackend for BufferBackend {
    fn mode(&self) -> DrawMode {
        DrawMode::BufferReplay
    }

    fn prepare(
        &mut self,
        device: &mut dyn Device,
        data: &ReplayData<'_>,
        _version: ChangeVersion,
        fresh: bool,
        stats: &mut ReplayStats,
    ) {
        let ext = extension(device);
        if fresh || self.buffer.is_none() {
            if let Some(old) = self.buffer.take() {
                ext.delete_token_buffer(old);
            }
            let bytes = data.sequence.stream().as_bytes();
            self.buffer = Some(ext.create_token_buffer(bytes));
            stats.token_uploads += 1;
            log::debug!("uploaded {} token bytes", bytes.len());
        }
        self.segments.clear();
        self.segments.extend_from_slice(data.sequence.segments());
    }

    fn replay(&mut self, device: &mut dyn Device, _data: &ReplayData<'_>, _frame: &FrameContext<'_>) {
        let buffer = self
            .buffer
            .expect("replay always follows prepare");
        extension(device).draw_commands_states(buffer, &self.segments);
    }

    fn release(&mut self, device: &mut dyn Device) {
        if let Some(buffer) = self.buffer.take() {
            extension(device).delete_token_buffer(buffer);
        }
    }
}
