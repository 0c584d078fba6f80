use crate::device::{CommandListExt, Device};
use crate::handle::CommandListId;
use crate::version::ChangeVersion;

use super::backend::{ReplayBackend, ReplayData};
use super::{DrawMode, FrameContext, ReplayStats};

/// Driver-compiled command list; replay is a single call.
///
/// The list bakes in state objects and framebuffers, so it is recompiled on
/// every version change.
#[derive(Debug, Default)]
pub(crate) struct ListBackend {
    list: Option<CommandListId>,
    compiled: Option<ChangeVersion>,
}

fn extension(device: &mut dyn Device) -> &mut dyn CommandListExt {
    device
        .command_list()
        .expect("list replay is only selectable with command-list support")
}

impl ReplayBackend for ListBackend {
    fn mode(&self) -> DrawMode {
        DrawMode::HardwareList
    }

    fn prepare(
        &mut self,
        device: &mut dyn Device,
        data: &ReplayData<'_>,
        version: ChangeVersion,
        _fresh: bool,
        stats: &mut ReplayStats,
    ) {
        let ext = extension(device);
        let list = *self.list.get_or_insert_with(|| ext.create_command_list());
        ext.compile_command_list(
            list,
            data.sequence.stream().as_bytes(),
            data.sequence.segments(),
        );
        self.compiled = Some(version);
        stats.list_compiles += 1;
        log::debug!(
            "compiled command list {list:?}: {} segments",
            data.sequence.segments().len()
        );
    }

    fn replay(&mut self, device: &mut dyn Device, _data: &ReplayData<'_>, frame: &FrameContext<'_>) {
        assert_eq!(
            self.compiled,
            Some(frame.version),
            "command list replayed against a stale change version"
        );
        let list = self
            .list
            .expect("a compiled version implies a created list");
        extension(device).call_command_list(list);
    }

    fn release(&mut self, device: &mut dyn Device) {
        self.compiled = None;
        if let Some(list) = self.list.take() {
            extension(device).delete_command_list(list);
        }
    }
}
