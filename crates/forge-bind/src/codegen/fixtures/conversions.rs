#[allow(unused_imports)]
use crate::glue::*;

pub fn rest_numbers(cx: &dyn ScriptContext, args: &[ScriptValue]) -> Fallible<Vec<f64>> {
    let rest: Vec<f64> = {
        let mut converted: Vec<f64> = Vec::with_capacity(args.len());
        for idx in 0..args.len() {
            converted.push(match <f64 as FromScriptValue>::from_script_value(cx, &args[idx], FloatBehavior::Restricted) {
                Ok(value) => value,
                Err(_) => return Err(Failure),
            });
        }
        converted
    };
    Ok(rest)
}

pub fn sequence_numbers(cx: &dyn ScriptContext, value: ScriptValue) -> Fallible<Vec<f64>> {
    let values: Vec<f64> = match sequence_elements(cx, &value) {
        Ok(elements) => {
            let mut converted: Vec<f64> = Vec::with_capacity(elements.len());
            for idx in 0..elements.len() {
                converted.push(match <f64 as FromScriptValue>::from_script_value(cx, &elements[idx], FloatBehavior::Restricted) {
                    Ok(value) => value,
                    Err(_) => return Err(Failure),
                });
            }
            converted
        },
        Err(_) => return Err(Failure),
    };
    Ok(values)
}
