mod common;

use common::synthetic_volume::{constant_volume_u8, gradient_volume_u8};
use slicewise::filters::{AddSlices, BoxMean, Identity, RescaleIntensity};
use slicewise::{
    extract_slice, CancelToken, OpFailure, PixelFormat, Slice, SliceError, SliceOp, SliceProcessor,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Pass-through operation counting how many times it actually ran, to
/// observe cache reuse versus recomputation. Its configuration version is
/// read from a shared handle, the way a caller retains access to a bound
/// operation's parameters.
#[derive(Debug)]
struct CountingOp {
    runs: Arc<AtomicUsize>,
    version: Arc<AtomicU64>,
    input: Option<Slice>,
    output: Option<Slice>,
}

impl CountingOp {
    fn new(runs: Arc<AtomicUsize>, version: Arc<AtomicU64>) -> Self {
        Self {
            runs,
            version,
            input: None,
            output: None,
        }
    }
}

impl SliceOp for CountingOp {
    fn input_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn output_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn set_input(&mut self, slot: usize, slice: Slice) -> Result<(), OpFailure> {
        assert_eq!(slot, 0);
        self.input = Some(slice);
        Ok(())
    }

    fn run(&mut self) -> Result<(), OpFailure> {
        let slice = self
            .input
            .take()
            .ok_or_else(|| OpFailure::new("no input staged"))?;
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.output = Some(slice);
        Ok(())
    }

    fn take_output(&mut self) -> Option<Slice> {
        self.output.take()
    }

    fn config_version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    fn duplicate(&self) -> Box<dyn SliceOp> {
        Box::new(Self::new(self.runs.clone(), self.version.clone()))
    }
}

#[test]
fn identity_round_trip_returns_the_exact_input() {
    let volume = gradient_volume_u8(&[4, 4, 3]);

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.set_axis(2);
    processor
        .bind_filter(Box::new(Identity::new(PixelFormat::U8)))
        .unwrap();

    let output = processor.execute(&[&volume]).unwrap();
    assert_eq!(output.buffer(), volume.buffer());
    assert_eq!(output.region(), volume.region());
}

#[test]
fn box_mean_with_radius_exceeding_slice_extent_flattens_each_slice() {
    // radius 5 over 4x4 slices: every window covers the whole slice, so each
    // output slice is constant at the rounded mean of its input slice.
    let volume = gradient_volume_u8(&[4, 4, 3]);

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.set_axis(2);
    processor.bind_filter(Box::new(BoxMean::new(5))).unwrap();

    let output = processor.execute(&[&volume]).unwrap();
    for index in 0..3 {
        let input_slice = extract_slice(&volume, 2, index).unwrap();
        let data = input_slice.buffer().as_u8().unwrap();
        let sum: u32 = data.iter().map(|&v| u32::from(v)).sum();
        let expected = (f64::from(sum) / data.len() as f64).round() as u8;

        let output_slice = extract_slice(&output, 2, index).unwrap();
        for &v in output_slice.buffer().as_u8().unwrap() {
            assert_eq!(v, expected, "slice {index} not flattened to its mean");
        }
    }
}

#[test]
fn add_then_rescale_maps_a_constant_volume_to_out_min() {
    // two identical constant-10 inputs sum to a constant-20 intermediate;
    // a constant slice has no usable scale, so the rescale stage maps it to
    // the lower end of its output range.
    let volume = constant_volume_u8(&[4, 4, 2], 10);

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.bind_entry(Box::new(AddSlices::new())).unwrap();
    processor
        .bind_exit(Box::new(RescaleIntensity::new(3, 250)))
        .unwrap();

    let output = processor.execute(&[&volume, &volume]).unwrap();
    for &v in output.buffer().as_u8().unwrap() {
        assert_eq!(v, 3);
    }
}

#[test]
fn unbound_execution_is_rejected() {
    let volume = gradient_volume_u8(&[4, 4, 3]);
    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    assert!(matches!(
        processor.execute(&[&volume]),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn entry_without_exit_is_rejected_at_execute() {
    let volume = gradient_volume_u8(&[4, 4, 3]);
    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.bind_entry(Box::new(AddSlices::new())).unwrap();
    assert!(matches!(
        processor.execute(&[&volume, &volume]),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn staging_into_a_unified_binding_is_rejected_at_assignment() {
    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor
        .bind_filter(Box::new(Identity::new(PixelFormat::U8)))
        .unwrap();
    assert!(matches!(
        processor.bind_entry(Box::new(AddSlices::new())),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn mismatched_split_stages_are_rejected_at_bind_time() {
    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor
        .bind_exit(Box::new(RescaleIntensity::new(0, 255)))
        .unwrap();
    // identity produces u8 slices; the rescale stage consumes u16
    assert!(matches!(
        processor.bind_entry(Box::new(Identity::new(PixelFormat::U8))),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn wrong_input_volume_count_is_rejected() {
    let volume = gradient_volume_u8(&[4, 4, 2]);
    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.bind_entry(Box::new(AddSlices::new())).unwrap();
    processor
        .bind_exit(Box::new(RescaleIntensity::new(0, 255)))
        .unwrap();
    assert!(matches!(
        processor.execute(&[&volume]),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn cached_output_is_reused_until_configuration_or_input_changes() {
    let mut volume = gradient_volume_u8(&[4, 4, 3]);
    let runs = Arc::new(AtomicUsize::new(0));
    let op_version = Arc::new(AtomicU64::new(0));

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor
        .bind_filter(Box::new(CountingOp::new(runs.clone(), op_version.clone())))
        .unwrap();

    let first = processor.execute(&[&volume]).unwrap();
    assert_eq!(runs.load(Ordering::Relaxed), 3);

    // unchanged configuration and input: cached output, no extra runs
    let second = processor.execute(&[&volume]).unwrap();
    assert_eq!(runs.load(Ordering::Relaxed), 3);
    assert_eq!(first.buffer(), second.buffer());

    // axis change invalidates the cache (extent 4 along axis 0)
    processor.set_axis(0);
    processor.execute(&[&volume]).unwrap();
    assert_eq!(runs.load(Ordering::Relaxed), 7);

    // a parameter change on the bound operation invalidates it too
    op_version.store(1, Ordering::Relaxed);
    processor.execute(&[&volume]).unwrap();
    assert_eq!(runs.load(Ordering::Relaxed), 11);

    // input mutation invalidates the cache as well
    volume
        .set(&[0, 0, 0], slicewise::PixelValue::U8(99))
        .unwrap();
    processor.execute(&[&volume]).unwrap();
    assert_eq!(runs.load(Ordering::Relaxed), 15);
}

#[test]
fn axis_change_produces_axis_sensitive_output() {
    let volume = gradient_volume_u8(&[4, 4, 3]);

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.bind_filter(Box::new(BoxMean::new(1))).unwrap();

    processor.set_axis(2);
    let along_z = processor.execute(&[&volume]).unwrap();
    processor.set_axis(0);
    let along_x = processor.execute(&[&volume]).unwrap();

    assert_ne!(
        along_z.buffer(),
        along_x.buffer(),
        "neighborhood averaging must depend on the slicing axis"
    );
}

#[test]
fn each_output_slice_equals_the_operation_applied_to_its_input_slice() {
    let volume = gradient_volume_u8(&[3, 4, 2]);

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.set_axis(1);
    processor.bind_filter(Box::new(BoxMean::new(1))).unwrap();
    let output = processor.execute(&[&volume]).unwrap();

    for index in 0..4 {
        let mut reference = BoxMean::new(1);
        reference
            .set_input(0, extract_slice(&volume, 1, index).unwrap())
            .unwrap();
        reference.run().unwrap();
        let expected = reference.take_output().unwrap();

        let actual = extract_slice(&output, 1, index).unwrap();
        assert_eq!(actual, expected, "slice {index} differs");
    }
}

#[test]
fn cancelled_token_aborts_without_output() {
    let volume = gradient_volume_u8(&[4, 4, 3]);

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor
        .bind_filter(Box::new(Identity::new(PixelFormat::U8)))
        .unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        processor.execute_with_cancel(&[&volume], &cancel),
        Err(SliceError::Cancelled)
    ));
}

#[test]
fn axis_out_of_range_is_rejected_at_execute() {
    let volume = gradient_volume_u8(&[4, 4, 3]);
    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.set_axis(3);
    processor
        .bind_filter(Box::new(Identity::new(PixelFormat::U8)))
        .unwrap();
    assert!(matches!(
        processor.execute(&[&volume]),
        Err(SliceError::Configuration(_))
    ));
}
