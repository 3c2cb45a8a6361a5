use super::{context::Runtime, error::FatalResult, object::Object, value::Value};

impl Runtime {
    /// Builds a proper list holding `values` in order.
    pub fn make_list(&mut self, values: &[Value]) -> FatalResult<Value> {
        self.with_roots(values, |rt| {
            values
                .iter()
                .rev()
                .try_fold(Value::NIL, |list, &value| rt.make_pair(value, list))
        })
    }

    /// Elements of a list up to its first non-pair tail.
    pub fn list_values(&self, list: Value) -> Vec<Value> {
        let mut values = Vec::new();
        let mut list = list;
        while let Some(Object::Pair(car, cdr)) = self.heap.get(list) {
            values.push(*car);
            list = *cdr;
        }
        values
    }
}
