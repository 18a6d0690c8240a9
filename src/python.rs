use std::sync::Mutex;

use pyo3::prelude::*;

use crate::{
    start_motion_loop, LoggingPwmSink, MotionCommand, MotionLoopConfig, MotionLoopHandle,
    PanTiltRig, PwmSink, RigConfig, RigError,
};

type DynHandle = MotionLoopHandle<Box<dyn PwmSink>>;

fn to_py_err(e: RigError) -> PyErr {
    match e {
        RigError::InvalidConfig(_) | RigError::InvalidAngle(_) => {
            pyo3::exceptions::PyValueError::new_err(e.to_string())
        }
        _ => pyo3::exceptions::PyRuntimeError::new_err(e.to_string()),
    }
}

fn rig_config(config_json: Option<String>) -> Result<RigConfig, RigError> {
    match config_json {
        Some(json) => RigConfig::from_json_str(&json),
        None => Ok(RigConfig::default()),
    }
}

#[pyclass]
pub struct PanTiltPyController {
    handle: Mutex<Option<DynHandle>>,
}

impl PanTiltPyController {
    fn start(pan: Box<dyn PwmSink>, tilt: Box<dyn PwmSink>, cfg: RigConfig) -> PyResult<Self> {
        let rig = PanTiltRig::new(pan, tilt, cfg).map_err(to_py_err)?;
        let handle = start_motion_loop(rig, MotionLoopConfig::default()).map_err(to_py_err)?;
        Ok(Self { handle: Mutex::new(Some(handle)) })
    }

    fn with_handle<R>(&self, f: impl FnOnce(&DynHandle) -> Result<R, RigError>) -> PyResult<R> {
        let guard = self
            .handle
            .lock()
            .map_err(|_| pyo3::exceptions::PyRuntimeError::new_err("controller lock poisoned"))?;
        let handle = guard
            .as_ref()
            .ok_or_else(|| pyo3::exceptions::PyRuntimeError::new_err("controller is closed"))?;
        f(handle).map_err(to_py_err)
    }
}

#[pymethods]
impl PanTiltPyController {
    /// Rig without hardware; every write is only logged.
    #[staticmethod]
    pub fn new_logging(config_json: Option<String>) -> PyResult<Self> {
        let cfg = rig_config(config_json).map_err(to_py_err)?;
        let sink = LoggingPwmSink::new("python");
        Self::start(Box::new(sink.clone()), Box::new(sink), cfg)
    }

    #[cfg(feature = "hardware")]
    #[staticmethod]
    pub fn new_pca9685(bus: Option<u8>, address: Option<u8>, config_json: Option<String>) -> PyResult<Self> {
        use crate::{Pca9685Config, Pca9685Sink};

        let cfg = rig_config(config_json).map_err(to_py_err)?;
        let defaults = Pca9685Config::default();
        let sink = Pca9685Sink::open(Pca9685Config {
            bus: bus.unwrap_or(defaults.bus),
            address: address.unwrap_or(defaults.address),
            ..defaults
        })
        .map_err(to_py_err)?;
        Self::start(Box::new(sink.clone()), Box::new(sink), cfg)
    }

    pub fn move_to(&self, pan_deg: f64, tilt_deg: f64, speed: Option<f64>) -> PyResult<()> {
        self.with_handle(|h| h.push(MotionCommand::MoveTo { pan_deg, tilt_deg, speed }))
    }

    pub fn move_by(&self, pan_delta: f64, tilt_delta: f64, speed: Option<f64>) -> PyResult<()> {
        self.with_handle(|h| h.push(MotionCommand::MoveBy { pan_delta, tilt_delta, speed }))
    }

    pub fn move_to_center(&self, speed: Option<f64>) -> PyResult<()> {
        self.with_handle(|h| h.push(MotionCommand::Center { speed }))
    }

    /// `(pan, tilt)` after the last finished command.
    pub fn get_angles(&self) -> PyResult<(f64, f64)> {
        self.with_handle(|h| h.last_snapshot().map(|s| (s.pan_deg, s.tilt_deg)))
    }

    /// Stops the motion loop and waits for its thread to exit.
    pub fn close(&self, py: Python<'_>) {
        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = py.allow_threads(move || handle.shutdown());
        }
    }
}

#[pymodule]
fn pan_tilt_rig(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PanTiltPyController>()?;
    Ok(())
}
