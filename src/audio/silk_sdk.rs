//! [`CodecEngine`] backed by the SILK SDK fixed-point decoder.

use std::ffi::{c_int, c_void};

use super::engine::{is_silk_rate, CodecEngine, DecodeControl, EngineError, Subframe, SubframeStatus};

// ======================== FFI declarations ========================

/// Mirror of `SKP_SILK_SDK_DecControlStruct`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SkpDecControl {
    api_sample_rate: i32,
    frame_size: c_int,
    frames_per_packet: c_int,
    more_internal_decoder_frames: c_int,
    in_band_fec_offset: c_int,
}

const SKP_SILK_NO_ERROR: c_int = 0;

unsafe extern "C" {
    fn SKP_Silk_SDK_Get_Decoder_Size(dec_size_bytes: *mut i32) -> c_int;
    fn SKP_Silk_SDK_InitDecoder(dec_state: *mut c_void) -> c_int;
    fn SKP_Silk_SDK_Decode(
        dec_state: *mut c_void,
        dec_control: *mut SkpDecControl,
        lost_flag: c_int,
        in_data: *const u8,
        n_bytes_in: c_int,
        samples_out: *mut i16,
        n_samples_out: *mut i16,
    ) -> c_int;
}

// ======================== Engine ========================

/// The SDK keeps everything in the caller-provided state region, so the
/// engine itself is a unit value.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilkSdkEngine;

impl SilkSdkEngine {
    pub fn new() -> Self {
        Self
    }
}

impl CodecEngine for SilkSdkEngine {
    fn state_size(&self) -> usize {
        let mut size: i32 = 0;
        let ret = unsafe { SKP_Silk_SDK_Get_Decoder_Size(&mut size) };
        if ret != SKP_SILK_NO_ERROR {
            log::error!("SKP_Silk_SDK_Get_Decoder_Size failed: {}", ret);
            return 0;
        }
        size.max(0) as usize
    }

    fn supports_sample_rate(&self, rate: i32) -> bool {
        is_silk_rate(rate)
    }

    fn init_state(&self, state: &mut [u8]) -> Result<(), EngineError> {
        let ret = unsafe { SKP_Silk_SDK_InitDecoder(state.as_mut_ptr() as *mut c_void) };
        if ret != SKP_SILK_NO_ERROR {
            return Err(EngineError::Status(ret));
        }
        Ok(())
    }

    fn decode_subframe(
        &self,
        state: &mut [u8],
        control: &mut DecodeControl,
        lost: bool,
        input: &[u8],
        output: &mut [i16],
    ) -> Result<Subframe, EngineError> {
        let n_bytes = c_int::try_from(input.len())
            .map_err(|_| EngineError::Other(format!("packet of {} bytes", input.len())))?;

        let mut ctrl = SkpDecControl {
            api_sample_rate: control.sample_rate,
            frame_size: control.frame_size,
            frames_per_packet: control.frames_per_packet,
            more_internal_decoder_frames: c_int::from(control.more_internal_frames),
            in_band_fec_offset: 0,
        };
        let mut produced: i16 = 0;

        // The frame loop only calls with room for a full 20 ms at the
        // requested rate, which is the most the SDK writes per call.
        let ret = unsafe {
            SKP_Silk_SDK_Decode(
                state.as_mut_ptr() as *mut c_void,
                &mut ctrl,
                c_int::from(lost),
                input.as_ptr(),
                n_bytes,
                output.as_mut_ptr(),
                &mut produced,
            )
        };

        control.frame_size = ctrl.frame_size;
        control.frames_per_packet = ctrl.frames_per_packet;
        control.more_internal_frames = ctrl.more_internal_decoder_frames != 0;

        if ret != SKP_SILK_NO_ERROR {
            control.more_internal_frames = false;
            return Err(EngineError::Status(ret));
        }

        let status = if lost {
            SubframeStatus::Concealed
        } else {
            SubframeStatus::Decoded
        };
        Ok(Subframe {
            samples: produced.max(0) as usize,
            status,
        })
    }
}
