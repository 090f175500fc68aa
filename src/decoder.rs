use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::functions::{FUNCTION_GROUPS, FunctionCache};
use crate::gamma::{COOL_WHITE_LUT, GammaTable, WARM_WHITE_LUT};
use crate::mix::mix;
use crate::profile::{LightProfile, ProfileSelection, TRIGGER_UNUSED, select_active_profile};
use crate::protocol::ProtocolHandler;
use crate::registry::{CvError, CvRegistry, WriteOutcome};
use crate::reset::FactoryResetSequencer;
use crate::schema::{
    CV_BRIGHTNESS_1, CV_BRIGHTNESS_2, CV_CCT_1, CV_CCT_2, CV_LIGHT_TEST, CV_TRIGGER_1,
    CV_TRIGGER_2, CvDefinition, STANDARD_SCHEMA,
};
use crate::{LightChannel, PersistentStore, PwmOutput};

/// CV numbers one profile reads its parameters from.
#[derive(Debug, Clone, Copy)]
pub struct ProfileCvIds {
    pub brightness: u16,
    pub cct: u16,
    pub trigger: u16,
}

/// Configuration for the light decoder
///
/// Carries the whole per-variant surface: the CV schema, the CV roles,
/// the store layout, the acknowledgment pulse width and the gamma data.
#[derive(Clone)]
pub struct DecoderConfig<'a> {
    /// CV schema; the index of an entry is also its store address
    pub schema: &'a [CvDefinition],
    /// CVs of the primary (master-gated) parameter set
    pub profile1: ProfileCvIds,
    /// CVs of the override parameter set
    pub profile2: ProfileCvIds,
    /// CV switching the raw-duty test mode
    pub light_test_cv: u16,
    /// Store address of the 5-byte function state record
    pub function_state_address: u16,
    /// Width of the acknowledgment pulse
    pub ack_pulse: Duration,
    /// Gamma table of the warm white bank
    pub warm_lut: &'a GammaTable,
    /// Gamma table of the cool white bank
    pub cool_lut: &'a GammaTable,
}

impl DecoderConfig<'static> {
    /// The stock configuration: [`STANDARD_SCHEMA`], function record at
    /// the top of a 256-byte store, 6 ms acknowledgment pulse.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn standard() -> Self {
        Self {
            schema: &STANDARD_SCHEMA,
            profile1: ProfileCvIds {
                brightness: CV_BRIGHTNESS_1,
                cct: CV_CCT_1,
                trigger: CV_TRIGGER_1,
            },
            profile2: ProfileCvIds {
                brightness: CV_BRIGHTNESS_2,
                cct: CV_CCT_2,
                trigger: CV_TRIGGER_2,
            },
            light_test_cv: CV_LIGHT_TEST,
            function_state_address: 256 - FUNCTION_GROUPS as u16,
            ack_pulse: Duration::from_millis(6),
            warm_lut: &WARM_WHITE_LUT,
            cool_lut: &COOL_WHITE_LUT,
        }
    }
}

/// The decoder core - CV registry, function cache and mixing engine
/// behind the protocol callback contract.
///
/// Within one event the order is always cache update, persist,
/// recompute, push to PWM, so store and light output never disagree
/// with the in-memory state.
pub struct LightDecoder<'a, P: PwmOutput, S: PersistentStore> {
    config: DecoderConfig<'a>,
    registry: CvRegistry<'a>,
    functions: FunctionCache,
    reset: FactoryResetSequencer,
    in_service_mode: bool,
    pwm: P,
    store: S,
}

impl<'a, P: PwmOutput, S: PersistentStore> LightDecoder<'a, P, S> {
    /// Boot the decoder: restore the function record and CV cache from
    /// the store, then drive the lights to their pre-power-off state
    /// before any packet arrives.
    pub fn new(config: DecoderConfig<'a>, pwm: P, mut store: S) -> Self {
        let mut record = [0; FUNCTION_GROUPS];
        store.read_block(config.function_state_address, &mut record);
        let registry = CvRegistry::load(config.schema, &mut store);
        let mut decoder = Self {
            registry,
            functions: FunctionCache::from_bytes(record),
            reset: FactoryResetSequencer::new(),
            in_service_mode: false,
            config,
            pwm,
            store,
        };
        decoder.recompute();
        decoder
    }

    /// Advance the factory reset sequencer by one protocol-loop
    /// iteration. Call once per poll; costs at most one store write.
    pub fn poll_tick(&mut self) {
        let Some(index) = self.reset.tick() else {
            return;
        };
        if self.registry.apply_factory_default(index, &mut self.store) == WriteOutcome::Updated {
            self.recompute();
        }
    }

    /// Whether a factory reset is still replaying defaults.
    pub const fn factory_reset_pending(&self) -> bool {
        !self.reset.is_idle()
    }

    /// Access the PWM output port.
    pub const fn pwm(&self) -> &P {
        &self.pwm
    }

    /// Access the persistent store port.
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn write_cv(&mut self, id: u16, value: u8) -> u8 {
        match self.registry.write(id, value, &mut self.store) {
            Ok(WriteOutcome::Updated) => {
                #[cfg(feature = "esp32-log")]
                println!("[LightDecoder.write_cv] CV{} = {}", id, value);
                // Any CV can affect light output; recompute on every change
                self.recompute();
                value
            }
            Ok(WriteOutcome::Unchanged) => value,
            Err(CvError::NotFound) => {
                #[cfg(feature = "esp32-log")]
                println!("[LightDecoder.write_cv] unknown CV{}", id);
                0
            }
        }
    }

    /// Recompute both duties from the current state and push them.
    fn recompute(&mut self) {
        let (warm, cool) = self.output_duties();
        self.pwm.set_duty(LightChannel::Warm, warm);
        self.pwm.set_duty(LightChannel::Cool, cool);
    }

    fn output_duties(&self) -> (u8, u8) {
        if self.in_service_mode {
            return (0, 0);
        }

        let profile1 = self.profile(self.config.profile1);

        // Test mode: profile 1's brightness/CCT CVs are raw duties, the
        // gamma tables and profile selection are bypassed
        if self.read_or(self.config.light_test_cv, 0) != 0 {
            return (profile1.brightness, profile1.cct);
        }

        let profile2 = self.profile(self.config.profile2);
        let selected = match select_active_profile(&self.functions, &profile1, &profile2) {
            ProfileSelection::Off => return (0, 0),
            ProfileSelection::Profile1 => profile1,
            ProfileSelection::Profile2 => profile2,
        };
        let duties = mix(
            selected.brightness,
            selected.cct,
            self.config.warm_lut,
            self.config.cool_lut,
        );
        (duties.warm_duty, duties.cool_duty)
    }

    fn profile(&self, ids: ProfileCvIds) -> LightProfile {
        LightProfile {
            brightness: self.read_or(ids.brightness, 0),
            cct: self.read_or(ids.cct, 0),
            trigger_function: self.read_or(ids.trigger, TRIGGER_UNUSED),
        }
    }

    // A config/schema mismatch degrades to dark rather than lighting up
    fn read_or(&self, id: u16, fallback: u8) -> u8 {
        self.registry.read(id).unwrap_or(fallback)
    }
}

impl<P: PwmOutput, S: PersistentStore> ProtocolHandler for LightDecoder<'_, P, S> {
    fn on_config_variable_changed(&mut self, id: u16, value: u8) {
        // Same path as a write request; already-cached values are no-ops
        let _ = self.write_cv(id, value);
    }

    fn on_function_group_changed(&mut self, group: u8, bits: u8) {
        if !self.functions.update(group, bits) {
            return;
        }
        #[cfg(feature = "esp32-log")]
        println!(
            "[LightDecoder.on_function_group_changed] group {} = {:#010b}",
            group, bits
        );
        self.store.write_block(
            self.config.function_state_address,
            &self.functions.as_bytes(),
        );
        self.recompute();
    }

    fn on_factory_reset_requested(&mut self) {
        #[cfg(feature = "esp32-log")]
        println!("[LightDecoder.on_factory_reset_requested] arming");
        self.reset.arm(self.config.schema.len());
    }

    fn on_service_mode_entered(&mut self) {
        #[cfg(feature = "esp32-log")]
        println!("[LightDecoder.on_service_mode_entered]");
        self.in_service_mode = true;
        self.recompute();
    }

    fn on_service_mode_exited(&mut self) {
        #[cfg(feature = "esp32-log")]
        println!("[LightDecoder.on_service_mode_exited]");
        self.in_service_mode = false;
        self.recompute();
    }

    fn is_config_variable_valid(&self, id: u16, for_write: bool) -> bool {
        self.registry.is_valid(id, for_write)
    }

    fn read_config_variable(&self, id: u16) -> u8 {
        match self.registry.read(id) {
            Ok(value) => value,
            Err(CvError::NotFound) => {
                #[cfg(feature = "esp32-log")]
                println!("[LightDecoder.read_config_variable] unknown CV{}", id);
                0
            }
        }
    }

    fn write_config_variable(&mut self, id: u16, value: u8) -> u8 {
        self.write_cv(id, value)
    }

    fn on_acknowledge_requested(&mut self) {
        #[cfg(feature = "esp32-log")]
        println!("[LightDecoder.on_acknowledge_requested]");
        // Full power on both banks draws the extra current the command
        // station detects as the acknowledgment
        self.pwm.set_duty(LightChannel::Warm, 255);
        self.pwm.set_duty(LightChannel::Cool, 255);
        embassy_time::block_for(self.config.ack_pulse);
        // Acks happen inside service-mode sessions, where dark is the
        // resting state
        self.pwm.set_duty(LightChannel::Warm, 0);
        self.pwm.set_duty(LightChannel::Cool, 0);
    }
}
