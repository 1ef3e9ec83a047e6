#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::PyReadonlyArray1;

#[cfg(feature = "python-bindings")]
use crate::{
    data::ScatteringData,
    kernel::Shape,
    size_distribution::{
        DEFAULT_IPG_APPROACH, ResolutionModel, SizeMethod, WeightFactors, WeightType,
    },
};

/// Copy a 1-D numpy array, pandas Series, or float sequence into an
/// `Array1<f64>`; `name` labels the argument in the error message.
///
/// Elements are copied through an iterator because `numpy` may be built
/// against a newer `ndarray` than the crate's own.
#[cfg(feature = "python-bindings")]
pub fn extract_array1<'py>(raw: &Bound<'py, PyAny>, name: &str) -> PyResult<Array1<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray1<f64>>() {
        return Ok(arr.as_array().iter().copied().collect());
    }

    if let Ok(obj) = raw.call_method("to_numpy", (false,), None) {
        if let Ok(series) = obj.extract::<PyReadonlyArray1<f64>>() {
            return Ok(series.as_array().iter().copied().collect());
        }
    }

    let vec: Vec<f64> = raw.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(format!(
            "{name} must be a 1-D numpy.ndarray, pandas.Series, or sequence of float64"
        ))
    })?;
    Ok(Array1::from(vec))
}

#[cfg(feature = "python-bindings")]
pub fn extract_scattering_data<'py>(
    q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>, uncertainty: &Bound<'py, PyAny>,
) -> PyResult<ScatteringData> {
    let q = extract_array1(q, "q")?;
    let intensity = extract_array1(intensity, "intensity")?;
    let uncertainty = extract_array1(uncertainty, "uncertainty")?;
    Ok(ScatteringData::new(q, intensity, uncertainty)?)
}

#[cfg(feature = "python-bindings")]
pub fn extract_weight_type(name: Option<&str>, percent: Option<f64>) -> PyResult<WeightType> {
    let name = name.unwrap_or("dI").to_lowercase();
    let weight_type = match name.as_str() {
        "none" => WeightType::None,
        "di" | "uncertainty" => WeightType::Uncertainty,
        "sqrt(i)" | "sqrt" => WeightType::SqrtIntensity,
        "percent" | "%i" => {
            let p = percent.ok_or_else(|| {
                PyValueError::new_err("percent must be provided when weight_type='percent'")
            })?;
            WeightType::PercentIntensity(p)
        }
        other => {
            return Err(PyValueError::new_err(format!(
                "invalid weight type {:?} (expected 'none', 'dI', 'sqrt(I)', or 'percent')",
                other
            )));
        }
    };
    Ok(weight_type)
}

#[cfg(feature = "python-bindings")]
pub fn extract_method(
    method: Option<&str>, approach: Option<f64>, power: Option<i32>,
) -> PyResult<SizeMethod> {
    let method = method.unwrap_or("maxent").to_lowercase();
    match method.as_str() {
        "maxent" => Ok(SizeMethod::MaxEnt),
        "ipg" => Ok(SizeMethod::Ipg { approach: approach.unwrap_or(DEFAULT_IPG_APPROACH), power }),
        other => Err(PyValueError::new_err(format!(
            "invalid method {:?} (expected 'maxent' or 'ipg')",
            other
        ))),
    }
}

#[cfg(feature = "python-bindings")]
pub fn extract_shape(model: Option<&str>) -> PyResult<Shape> {
    match model {
        Some(name) => Ok(name.parse::<Shape>()?),
        None => Ok(Shape::default()),
    }
}

#[cfg(feature = "python-bindings")]
pub fn extract_weight_factors<'py>(
    raw: Option<&Bound<'py, PyAny>>,
) -> PyResult<WeightFactors> {
    let Some(raw) = raw else {
        return Ok(WeightFactors::default());
    };
    if let Ok(value) = raw.extract::<f64>() {
        return Ok(WeightFactors::Uniform(value));
    }
    Ok(WeightFactors::PerPoint(extract_array1(raw, "weight_factor")?))
}

#[cfg(feature = "python-bindings")]
pub fn extract_resolution(slit_length: Option<f64>) -> ResolutionModel {
    match slit_length {
        Some(slit_length) => ResolutionModel::Slit { slit_length },
        None => ResolutionModel::Perfect,
    }
}
