//! One parameterized statement, from binding to reshaped result.

use std::collections::HashMap;

use wharf_core::schema::Schema;
use wharf_core::types::{Frame, Value};
use wharf_params::{bind, BoundParameter, ParamSpec};
use wharf_warehouse::{QueryJob, WarehouseClient};

use crate::error::{Error, Result};
use crate::expr::{Expr, ScalarParameter};
use crate::lineage::find_scalar_parameters;

/// Compiled SQL with the expression it came from and its result schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub expr: Expr,
    pub schema: Schema,
}

impl Statement {
    pub fn new(sql: impl Into<String>, expr: Expr, schema: Schema) -> Self {
        Self {
            sql: sql.into(),
            expr,
            schema,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Created,
    ParametersBound,
    Submitted,
    Completed,
    Failed,
}

pub struct Query<'c, C: WarehouseClient> {
    client: &'c C,
    statement: Statement,
    billing_project: String,
    parameters: Vec<BoundParameter>,
    state: QueryState,
}

impl<'c, C: WarehouseClient> Query<'c, C> {
    /// Resolve every parameter in the statement's expression to its name and
    /// bind the supplied values. Parameters are bound in the order given.
    pub fn new(
        client: &'c C,
        statement: Statement,
        billing_project: impl Into<String>,
        params: &[(ScalarParameter, Value)],
    ) -> Result<Self> {
        let mut query = Self {
            client,
            statement,
            billing_project: billing_project.into(),
            parameters: Vec::with_capacity(params.len()),
            state: QueryState::Created,
        };

        let names: HashMap<&ScalarParameter, String> =
            find_scalar_parameters(&query.statement.expr).into_iter().collect();
        let mut bound = Vec::with_capacity(params.len());
        for (param, value) in params {
            let name = names
                .get(param)
                .ok_or_else(|| Error::UnboundParameter(param.default_name()))?;
            let spec = ParamSpec::new(name.clone(), param.data_type.clone());
            bound.push(bind(&spec, value)?);
        }

        query.parameters = bound;
        query.state = QueryState::ParametersBound;
        Ok(query)
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    /// Submit, block until the job finishes, and reshape the rows through the
    /// statement's schema. A query runs at most once.
    pub fn execute(&mut self) -> Result<Frame> {
        if self.state != QueryState::ParametersBound {
            return Err(Error::InvalidState(self.state));
        }

        self.state = QueryState::Submitted;
        match self.run() {
            Ok(frame) => {
                self.state = QueryState::Completed;
                #[cfg(feature = "tracing")]
                tracing::debug!(rows = frame.num_rows(), "query completed");
                Ok(frame)
            }
            Err(e) => {
                self.state = QueryState::Failed;
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "query failed");
                Err(e)
            }
        }
    }

    fn run(&self) -> Result<Frame> {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            billing_project = %self.billing_project,
            parameters = self.parameters.len(),
            "submitting query"
        );

        let job = self
            .client
            .query(&self.statement.sql, &self.parameters, &self.billing_project)?;
        let cursor = job.wait()?;
        let frame = cursor.into_frame()?;
        Ok(self.statement.schema.apply_to(frame)?)
    }
}
