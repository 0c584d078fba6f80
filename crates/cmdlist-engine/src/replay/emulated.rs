use crate::device::{Device, execute_token};
use crate::handle::{FramebufferId, StateObjectId};
use crate::scene::Segment;
use crate::state::{GraphicsState, StateDiff};
use crate::token::{Token, TokenReader};
use crate::version::ChangeVersion;

use super::backend::{ReplayBackend, ReplayData};
use super::{DrawMode, FrameContext, ReplayStats};

/// Host interpretation of the token stream.
///
/// Segment switches apply the prepared transition between host state
/// objects; every token becomes its immediate-mode call.
#[derive(Debug, Default)]
pub(crate) struct EmulatedBackend {
    segments: Vec<Segment>,
}

impl ReplayBackend for EmulatedBackend {
    fn mode(&self) -> DrawMode {
        DrawMode::SoftwareEmulation
    }

    fn prepare(
        &mut self,
        _device: &mut dyn Device,
        data: &ReplayData<'_>,
        _version: ChangeVersion,
        _fresh: bool,
        _stats: &mut ReplayStats,
    ) {
        self.segments.clear();
        self.segments.extend_from_slice(data.emulated);
    }

    fn replay(&mut self, device: &mut dyn Device, data: &ReplayData<'_>, _frame: &FrameContext<'_>) {
        let stream = data.sequence.stream();
        let bytes = stream.as_bytes();

        let mut last_state: Option<StateObjectId> = None;
        let mut last_framebuffer: Option<FramebufferId> = None;

        for segment in &self.segments {
            if last_framebuffer != Some(segment.framebuffer) {
                device.bind_framebuffer(Some(segment.framebuffer));
                last_framebuffer = Some(segment.framebuffer);
            }
            if last_state != Some(segment.state) {
                data.host.apply(device, segment.state, last_state);
                last_state = Some(segment.state);
            }
            let captured_mode = data.host.mode(segment.state);

            let reader = TokenReader::with_base(stream.format(), &bytes[segment.range()], segment.offset);
            for item in reader {
                let (offset, token) = item.unwrap_or_else(|err| panic!("corrupt token stream: {err}"));
                if let Token::DrawIndexed { mode, .. } = token {
                    debug_assert_eq!(
                        Some(mode),
                        captured_mode,
                        "draw at offset {offset} does not match the mode {} was captured with",
                        segment.state
                    );
                }
                execute_token(device, &token);
            }
        }

        if let Some(last) = last_state.and_then(|id| data.host.get(id)) {
            StateDiff::between(last, &GraphicsState::default()).apply(device);
        }
    }
}
