mod tests {
    use dcc_light_decoder::{
        COOL_WHITE_LUT, DecoderConfig, LightChannel, LightDecoder, PersistentStore,
        ProtocolHandler, PwmOutput, STANDARD_SCHEMA, WARM_WHITE_LUT,
    };

    const STORE_SIZE: usize = 256;
    const FUNCTION_RECORD_ADDRESS: usize = 251;

    struct MemoryStore {
        bytes: [u8; STORE_SIZE],
        writes: usize,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                bytes: [0; STORE_SIZE],
                writes: 0,
            }
        }
    }

    impl PersistentStore for MemoryStore {
        fn read_byte(&mut self, address: u16) -> u8 {
            self.bytes[address as usize]
        }

        fn write_byte(&mut self, address: u16, value: u8) {
            self.bytes[address as usize] = value;
            self.writes += 1;
        }
    }

    #[derive(Default)]
    struct RecordingPwm {
        warm: u8,
        cool: u8,
        peak: u8,
        pushes: usize,
    }

    impl PwmOutput for RecordingPwm {
        fn set_duty(&mut self, channel: LightChannel, value: u8) {
            match channel {
                LightChannel::Warm => self.warm = value,
                LightChannel::Cool => self.cool = value,
            }
            self.peak = self.peak.max(value);
            self.pushes += 1;
        }
    }

    type Decoder = LightDecoder<'static, RecordingPwm, MemoryStore>;

    // Store image of a device programmed with brightness 80, CCT 128,
    // master trigger F1 (currently on), override profile unused
    fn programmed_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.bytes[7] = 80; // CV1000 brightness
        store.bytes[8] = 128; // CV1001 CCT
        store.bytes[9] = 1; // CV1002 trigger = F1
        store.bytes[10] = 30; // CV1003 brightness 2
        store.bytes[11] = 255; // CV1004 CCT 2
        store.bytes[12] = 255; // CV1005 trigger 2 unused
        store.bytes[FUNCTION_RECORD_ADDRESS] = 0b0000_0001; // F1 on
        store
    }

    fn boot(store: MemoryStore) -> Decoder {
        LightDecoder::new(DecoderConfig::standard(), RecordingPwm::default(), store)
    }

    #[test]
    fn test_boot_restores_persisted_light_state() {
        let decoder = boot(programmed_store());
        // 80 * 127 / 256 = 39, 80 * 128 / 256 = 40
        assert_eq!(decoder.pwm().warm, WARM_WHITE_LUT[39]);
        assert_eq!(decoder.pwm().cool, COOL_WHITE_LUT[40]);
    }

    #[test]
    fn test_boot_from_blank_store_stays_dark() {
        let decoder = boot(MemoryStore::new());
        assert_eq!(decoder.pwm().warm, 0);
        assert_eq!(decoder.pwm().cool, 0);
    }

    #[test]
    fn test_redundant_write_is_a_no_op() {
        let mut decoder = boot(programmed_store());
        let writes = decoder.store().writes;
        let pushes = decoder.pwm().pushes;
        assert_eq!(decoder.write_config_variable(1000, 80), 80);
        assert_eq!(decoder.store().writes, writes);
        assert_eq!(decoder.pwm().pushes, pushes);
    }

    #[test]
    fn test_write_persists_at_schema_index_and_recomputes() {
        let mut decoder = boot(programmed_store());
        let writes = decoder.store().writes;
        decoder.write_config_variable(1001, 0);
        assert_eq!(decoder.store().writes, writes + 1);
        assert_eq!(decoder.store().bytes[8], 0);
        // all brightness now routes to the warm bank: 80 * 255 / 256 = 79
        assert_eq!(decoder.pwm().warm, WARM_WHITE_LUT[79]);
        assert_eq!(decoder.pwm().cool, 0);
    }

    #[test]
    fn test_change_report_uses_the_write_path() {
        let mut decoder = boot(programmed_store());
        decoder.on_config_variable_changed(1001, 0);
        assert_eq!(decoder.read_config_variable(1001), 0);
        assert_eq!(decoder.pwm().cool, 0);
    }

    #[test]
    fn test_unknown_cv_is_rejected() {
        let mut decoder = boot(programmed_store());
        assert!(!decoder.is_config_variable_valid(999, false));
        assert!(!decoder.is_config_variable_valid(999, true));
        let writes = decoder.store().writes;
        let pushes = decoder.pwm().pushes;
        assert_eq!(decoder.read_config_variable(999), 0);
        assert_eq!(decoder.write_config_variable(999, 42), 0);
        assert_eq!(decoder.store().writes, writes);
        assert_eq!(decoder.pwm().pushes, pushes);
    }

    #[test]
    fn test_read_only_cv_is_not_writable() {
        let decoder = boot(programmed_store());
        assert!(decoder.is_config_variable_valid(8, false));
        assert!(!decoder.is_config_variable_valid(8, true));
        assert!(decoder.is_config_variable_valid(29, true));
    }

    #[test]
    fn test_function_group_change_persists_and_recomputes() {
        let mut decoder = boot(programmed_store());
        decoder.on_function_group_changed(0, 0); // F1 off
        assert_eq!(decoder.pwm().warm, 0);
        assert_eq!(decoder.pwm().cool, 0);
        assert_eq!(decoder.store().bytes[FUNCTION_RECORD_ADDRESS], 0);

        let writes = decoder.store().writes;
        decoder.on_function_group_changed(0, 0); // redundant packet
        assert_eq!(decoder.store().writes, writes);

        decoder.on_function_group_changed(0, 0b0000_0001); // F1 back on
        assert_eq!(decoder.pwm().warm, WARM_WHITE_LUT[39]);
        assert_eq!(decoder.pwm().cool, COOL_WHITE_LUT[40]);
    }

    #[test]
    fn test_override_profile_switches_parameter_set() {
        let mut decoder = boot(programmed_store());
        decoder.write_config_variable(1005, 10); // assign F10 as override
        decoder.on_function_group_changed(2, 0b0000_0010); // F10 on
        // profile 2: brightness 30, CCT 255 -> cool share 30 * 255 / 256 = 29
        assert_eq!(decoder.pwm().warm, WARM_WHITE_LUT[0]);
        assert_eq!(decoder.pwm().cool, COOL_WHITE_LUT[29]);

        decoder.on_function_group_changed(2, 0); // F10 off again
        assert_eq!(decoder.pwm().warm, WARM_WHITE_LUT[39]);
        assert_eq!(decoder.pwm().cool, COOL_WHITE_LUT[40]);
    }

    #[test]
    fn test_service_mode_forces_dark_until_exit() {
        let mut decoder = boot(programmed_store());
        decoder.on_service_mode_entered();
        assert_eq!(decoder.pwm().warm, 0);
        assert_eq!(decoder.pwm().cool, 0);

        // a write mid-session must not relight the banks
        decoder.write_config_variable(1000, 200);
        assert_eq!(decoder.pwm().warm, 0);
        assert_eq!(decoder.pwm().cool, 0);

        decoder.on_service_mode_exited();
        // 200 * 127 / 256 = 99, 200 * 128 / 256 = 100
        assert_eq!(decoder.pwm().warm, WARM_WHITE_LUT[99]);
        assert_eq!(decoder.pwm().cool, COOL_WHITE_LUT[100]);
    }

    #[test]
    fn test_light_test_mode_bypasses_gamma() {
        let mut decoder = boot(programmed_store());
        decoder.write_config_variable(1010, 1);
        assert_eq!(decoder.pwm().warm, 80);
        assert_eq!(decoder.pwm().cool, 128);

        decoder.write_config_variable(1010, 0);
        assert_eq!(decoder.pwm().warm, WARM_WHITE_LUT[39]);
        assert_eq!(decoder.pwm().cool, COOL_WHITE_LUT[40]);
    }

    #[test]
    fn test_factory_reset_replays_defaults_one_write_per_tick() {
        let mut store = MemoryStore::new();
        store.bytes[1] = 77; // CV7, read only, must survive the reset
        let mut decoder = boot(store);

        decoder.on_factory_reset_requested();
        assert!(decoder.factory_reset_pending());

        for _ in 0..STANDARD_SCHEMA.len() {
            let writes = decoder.store().writes;
            decoder.poll_tick();
            assert!(decoder.store().writes - writes <= 1);
        }
        assert!(!decoder.factory_reset_pending());

        assert_eq!(decoder.read_config_variable(1), 3);
        assert_eq!(decoder.read_config_variable(29), 2);
        assert_eq!(decoder.read_config_variable(1000), 50);
        assert_eq!(decoder.read_config_variable(1001), 255);
        assert_eq!(decoder.read_config_variable(1002), 1);
        assert_eq!(decoder.read_config_variable(1003), 30);
        assert_eq!(decoder.read_config_variable(1004), 255);
        assert_eq!(decoder.read_config_variable(1005), 20);
        assert_eq!(decoder.read_config_variable(7), 77);

        // ticking an idle sequencer does nothing
        let writes = decoder.store().writes;
        decoder.poll_tick();
        assert_eq!(decoder.store().writes, writes);
    }

    #[test]
    fn test_acknowledge_pulses_both_banks() {
        let mut decoder = boot(programmed_store());
        decoder.on_service_mode_entered();
        decoder.on_acknowledge_requested();
        assert_eq!(decoder.pwm().peak, 255);
        assert_eq!(decoder.pwm().warm, 0);
        assert_eq!(decoder.pwm().cool, 0);
    }
}
