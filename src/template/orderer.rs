//! Required/default enforcement and stable template ordering.

use std::collections::{BTreeMap, HashSet};

use crate::model::{Backend, Configuration, OrgId, Template, TemplateId};

use super::TemplateError;

/// Sorts a template selection into its final order.
///
/// Required templates come first, then default templates, both by creation
/// sequence; the rest keep their selection order. Duplicates are dropped,
/// keeping the first occurrence.
#[must_use]
pub fn sort_templates(selection: &[&Template]) -> Vec<TemplateId> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<(usize, &Template)> = selection
        .iter()
        .copied()
        .filter(|t| seen.insert(t.id.clone()))
        .enumerate()
        .collect();

    // Stable sort: position breaks ties only in the explicit group.
    ranked.sort_by(|(pos_a, a), (pos_b, b)| {
        rank(a).cmp(&rank(b)).then_with(|| {
            if rank(a) < 2 {
                (a.created, &a.id).cmp(&(b.created, &b.id))
            } else {
                pos_a.cmp(pos_b)
            }
        })
    });

    ranked.into_iter().map(|(_, t)| t.id.clone()).collect()
}

const fn rank(template: &Template) -> u8 {
    if template.required {
        0
    } else if template.default {
        1
    } else {
        2
    }
}

/// Checks that no other template in the same organization scope uses the
/// name of `candidate`.
///
/// # Errors
///
/// Returns [`TemplateError::DuplicateName`] on conflict.
pub fn check_unique_name<'a>(
    existing: impl IntoIterator<Item = &'a Template>,
    candidate: &Template,
) -> Result<(), TemplateError> {
    let clash = existing.into_iter().any(|t| {
        t.id != candidate.id && t.name == candidate.name && t.organization == candidate.organization
    });
    if clash {
        return Err(TemplateError::DuplicateName {
            name: candidate.name.clone(),
        });
    }
    Ok(())
}

/// Computes template lists for a configuration against a template catalog.
///
/// Every method is pure: it returns the new, sorted list and leaves the
/// configuration untouched, so a rejected mutation never commits anything.
#[derive(Debug, Clone, Copy)]
pub struct TemplateOrderer<'a> {
    templates: &'a BTreeMap<TemplateId, Template>,
}

impl<'a> TemplateOrderer<'a> {
    /// Creates an orderer over the given catalog.
    #[must_use]
    pub const fn new(templates: &'a BTreeMap<TemplateId, Template>) -> Self {
        Self { templates }
    }

    /// Looks up a template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] for unknown ids.
    pub fn get(&self, id: &TemplateId) -> Result<&'a Template, TemplateError> {
        self.templates
            .get(id)
            .ok_or_else(|| TemplateError::NotFound(id.clone()))
    }

    /// Returns the configuration's templates in final order.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] or [`TemplateError::BackendMismatch`]
    /// for references that do not resolve to a usable template.
    pub fn order(&self, configuration: &Configuration) -> Result<Vec<&'a Template>, TemplateError> {
        let selection = configuration
            .templates
            .iter()
            .map(|id| {
                let template = self.get(id)?;
                check_backend(template, &configuration.backend)?;
                Ok(template)
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        sort_templates(&selection)
            .iter()
            .map(|id| self.get(id))
            .collect()
    }

    /// Adds the templates a configuration must carry.
    ///
    /// An empty list receives every default template in scope; a non-empty
    /// list only receives the missing required ones.
    #[must_use]
    pub fn apply_required_defaults(
        &self,
        configuration: &Configuration,
        organization: &OrgId,
    ) -> Vec<TemplateId> {
        let backend = &configuration.backend;
        let mut selection: Vec<&Template> = configuration
            .templates
            .iter()
            .filter_map(|id| self.templates.get(id))
            .collect();

        let include_defaults = selection.is_empty();
        selection.extend(self.templates.values().filter(|t| {
            if include_defaults {
                t.is_default_for(backend, organization)
            } else {
                t.is_required_for(backend, organization)
            }
        }));
        sort_templates(&selection)
    }

    /// Replaces the selection with `requested`.
    ///
    /// # Errors
    ///
    /// Returns an error if a requested template is unusable or if an
    /// applicable required template is missing from `requested`.
    pub fn select(
        &self,
        configuration: &Configuration,
        organization: &OrgId,
        requested: &[TemplateId],
    ) -> Result<Vec<TemplateId>, TemplateError> {
        let selection = requested
            .iter()
            .map(|id| self.usable(id, &configuration.backend, organization))
            .collect::<Result<Vec<_>, TemplateError>>()?;

        if let Some(missing) = self
            .required_for(&configuration.backend, organization)
            .find(|t| !requested.contains(&t.id))
        {
            return Err(TemplateError::RequiredTemplateViolation {
                template: missing.id.clone(),
            });
        }
        Ok(sort_templates(&selection))
    }

    /// Appends one template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is unusable for this configuration.
    pub fn attach(
        &self,
        configuration: &Configuration,
        organization: &OrgId,
        template: &TemplateId,
    ) -> Result<Vec<TemplateId>, TemplateError> {
        let added = self.usable(template, &configuration.backend, organization)?;
        let mut selection = self.current(configuration);
        selection.push(added);
        Ok(sort_templates(&selection))
    }

    /// Removes one template. Removing an absent template is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::RequiredTemplateViolation`] for a template
    /// that is required in this configuration's scope.
    pub fn detach(
        &self,
        configuration: &Configuration,
        organization: &OrgId,
        template: &TemplateId,
    ) -> Result<Vec<TemplateId>, TemplateError> {
        let removed = self.get(template)?;
        if removed.is_required_for(&configuration.backend, organization) {
            return Err(TemplateError::RequiredTemplateViolation {
                template: template.clone(),
            });
        }
        let selection: Vec<&Template> = self
            .current(configuration)
            .into_iter()
            .filter(|t| &t.id != template)
            .collect();
        Ok(sort_templates(&selection))
    }

    /// Clears the selection, keeping the required templates.
    #[must_use]
    pub fn clear(&self, configuration: &Configuration, organization: &OrgId) -> Vec<TemplateId> {
        let selection: Vec<&Template> = self
            .required_for(&configuration.backend, organization)
            .collect();
        sort_templates(&selection)
    }

    /// Re-evaluates the selection for a new backend.
    ///
    /// Templates of another backend are dropped; required templates of the
    /// new backend are added, and default ones too if nothing survived.
    #[must_use]
    pub fn rebackend(
        &self,
        configuration: &Configuration,
        organization: &OrgId,
        backend: &Backend,
    ) -> Vec<TemplateId> {
        let kept: Vec<TemplateId> = self
            .current(configuration)
            .into_iter()
            .filter(|t| &t.backend == backend)
            .map(|t| t.id.clone())
            .collect();
        let mut moved = Configuration::new(configuration.device.clone(), backend.clone());
        moved.templates = kept;
        self.apply_required_defaults(&moved, organization)
    }

    /// Moves a selection into a new scope.
    ///
    /// Templates listed in `dropped` or not visible to `organization` leave
    /// the list. Templates in `added` that match the backend and are visible
    /// follow the kept ones, and the required templates in scope are added.
    #[must_use]
    pub fn rescope(
        &self,
        configuration: &Configuration,
        organization: &OrgId,
        dropped: &[TemplateId],
        added: &[TemplateId],
    ) -> Vec<TemplateId> {
        let backend = &configuration.backend;
        let mut selection: Vec<&Template> = self
            .current(configuration)
            .into_iter()
            .filter(|t| !dropped.contains(&t.id) && t.is_visible_to(organization))
            .collect();
        selection.extend(
            added
                .iter()
                .filter_map(|id| self.templates.get(id))
                .filter(|t| &t.backend == backend && t.is_visible_to(organization)),
        );
        selection.extend(self.required_for(backend, organization));
        sort_templates(&selection)
    }

    fn current(&self, configuration: &Configuration) -> Vec<&'a Template> {
        configuration
            .templates
            .iter()
            .filter_map(|id| self.templates.get(id))
            .collect()
    }

    fn required_for<'s>(
        &'s self,
        backend: &'s Backend,
        organization: &'s OrgId,
    ) -> impl Iterator<Item = &'a Template> + 's {
        self.templates
            .values()
            .filter(move |t| t.is_required_for(backend, organization))
    }

    /// Looks up a template a configuration may use.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`], [`TemplateError::BackendMismatch`]
    /// or [`TemplateError::OrganizationMismatch`].
    pub fn usable(
        &self,
        id: &TemplateId,
        backend: &Backend,
        organization: &OrgId,
    ) -> Result<&'a Template, TemplateError> {
        let template = self.get(id)?;
        check_backend(template, backend)?;
        if !template.is_visible_to(organization) {
            return Err(TemplateError::OrganizationMismatch {
                template: id.clone(),
                organization: organization.clone(),
            });
        }
        Ok(template)
    }
}

fn check_backend(template: &Template, backend: &Backend) -> Result<(), TemplateError> {
    if &template.backend == backend {
        return Ok(());
    }
    Err(TemplateError::BackendMismatch {
        template: template.id.clone(),
        expected: backend.clone(),
        found: template.backend.clone(),
    })
}
